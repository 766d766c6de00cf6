//! TOML configuration loading and validation.
//!
//! Every section is optional. Credentials missing from the file are taken
//! from `HL_USERNAME`, `HL_PASSWORD`, `HL_DATE_OF_BIRTH` and
//! `HL_SECURE_NUMBER`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use hargreaves::{Credentials, TransportConfig};

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub credentials: CredentialsConfig,
    pub session: SessionConfig,
    pub pacing: PacingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub date_of_birth: Option<String>,
    pub secure_number: Option<String>,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("CredentialsConfig")
            .field("username", &self.username)
            .field("password", &shown(&self.password))
            .field("date_of_birth", &shown(&self.date_of_birth))
            .field("secure_number", &shown(&self.secure_number))
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub timeout_secs: u64,
    pub retry_count: u32,
    /// Cookies are restored from and saved to this file when set.
    pub cookies_file: Option<PathBuf>,
    /// Redacted HAR captures are written here when set.
    pub har_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            retry_count: 1,
            cookies_file: None,
            har_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Pause between requests like a person clicking through the site.
    pub enabled: bool,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
    pub audit_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "./logs".into(),
            audit_file: "audit.jsonl".into(),
        }
    }
}

impl Config {
    /// Load config from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.session.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be > 0".into()));
        }
        if self.logging.audit_file.is_empty() {
            return Err(Error::Config("audit_file must not be empty".into()));
        }
        let c = &self.credentials;
        if let Some(dob) = &c.date_of_birth {
            check_date_of_birth(dob)?;
        }
        if let Some(digits) = &c.secure_number {
            check_secure_number(digits)?;
        }
        Ok(())
    }

    /// Credentials from the file, falling back to the process environment.
    pub fn credentials(&self) -> Result<Credentials> {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    /// Credentials from the file, falling back to `lookup` for each
    /// environment variable. Fails on the first field found in neither.
    pub fn credentials_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<Credentials> {
        let c = &self.credentials;
        let field = |value: &Option<String>, field: &'static str, env: &'static str| {
            value
                .clone()
                .or_else(|| lookup(env))
                .filter(|v| !v.is_empty())
                .ok_or(Error::MissingField { field, env })
        };

        let username = field(&c.username, "username", "HL_USERNAME")?;
        let password = field(&c.password, "password", "HL_PASSWORD")?;
        let date_of_birth = field(&c.date_of_birth, "date_of_birth", "HL_DATE_OF_BIRTH")?;
        let secure_number = field(&c.secure_number, "secure_number", "HL_SECURE_NUMBER")?;
        check_date_of_birth(&date_of_birth)?;
        check_secure_number(&secure_number)?;

        Ok(Credentials::new(username, password, date_of_birth, secure_number))
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_secs(self.session.timeout_secs),
            retry_count: self.session.retry_count,
            ..TransportConfig::default()
        }
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}

fn check_date_of_birth(dob: &str) -> Result<()> {
    if dob.len() != 6 || !dob.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Config("date_of_birth must be six digits (DDMMYY)".into()));
    }
    Ok(())
}

fn check_secure_number(digits: &str) -> Result<()> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Config("secure_number must contain digits only".into()));
    }
    Ok(())
}
