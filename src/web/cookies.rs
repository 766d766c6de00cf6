//! Cookies the site's scripts would set, and cookie persistence.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Domain every site cookie is scoped to.
pub const COOKIE_DOMAIN: &str = ".hl.co.uk";

/// Marker cookie set once the login journey completes.
pub const LOGGED_IN_MARKER: &str = "__mkt";

const SESSION_TIMEOUT_MS: i64 = 14 * 60 * 1000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

impl Cookie {
    /// A root-path cookie on the site domain.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: COOKIE_DOMAIN.to_string(),
            path: "/".to_string(),
        }
    }

    /// `Set-Cookie` header form.
    pub fn to_set_cookie(&self) -> String {
        format!(
            "{}={}; Domain={}; Path={}",
            self.name, self.value, self.domain, self.path
        )
    }
}

/// The cookies the site's scripts set for an anonymous visitor.
pub fn default_cookies(epoch_ms: i64, window_id: u32) -> Vec<Cookie> {
    let invest = serde_json::json!({
        "amount_lump": "0",
        "amount_regular": "0",
        "investment": [],
        "vmp_matrix": "",
    });
    let consent = serde_json::json!({"ao": true, "tp": true});

    vec![
        Cookie::new("at_check", "true"),
        Cookie::new("jsCheck", "yes"),
        Cookie::new("hl_cp", "1"),
        Cookie::new("invest", invest.to_string()),
        Cookie::new("hl_cookie_consent", consent.to_string()),
        hltimer_cookie(epoch_ms, window_id, false),
    ]
}

/// Cookies that mark the session as logged in.
pub fn logged_in_cookies(epoch_ms: i64, window_id: u32) -> Vec<Cookie> {
    vec![
        Cookie::new(LOGGED_IN_MARKER, "1"),
        hltimer_cookie(epoch_ms, window_id, true),
    ]
}

/// The session-timeout bookkeeping cookie written by the site's timeout script.
fn hltimer_cookie(epoch_ms: i64, window_id: u32, logged_in: bool) -> Cookie {
    let window = serde_json::json!({
        "to": epoch_ms + SESSION_TIMEOUT_MS,
        "li": i32::from(logged_in),
        "im": 1,
        "ia": 0,
        "ir": 0,
        "rp": 0,
        "sm": 0,
        "lp": 0,
        "lu": epoch_ms,
    });
    let mut value = serde_json::json!({
        "tom": if logged_in { epoch_ms + SESSION_TIMEOUT_MS } else { 0 },
        "ot": "900",
        "tos": 0,
        "smc": 0,
    });
    value[format!("HLWN{window_id}")] = window;
    Cookie::new("hltimer", value.to_string())
}

/// True when the logged-in marker is present.
pub fn is_logged_in(cookies: &[Cookie]) -> bool {
    cookies
        .iter()
        .any(|c| c.name == LOGGED_IN_MARKER && c.value == "1")
}

/// Persistence for the session's cookies between runs.
pub trait CookieStore {
    fn load(&self) -> Result<Vec<Cookie>>;
    fn save(&self, cookies: &[Cookie]) -> Result<()>;
}

/// Cookies as a JSON array on disk. A missing file loads as empty.
#[derive(Debug, Clone)]
pub struct FileCookieStore {
    path: PathBuf,
}

impl FileCookieStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CookieStore for FileCookieStore {
    fn load(&self) -> Result<Vec<Cookie>> {
        if !self.path.exists() {
            debug!("No cookie file at {}", self.path.display());
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        let cookies: Vec<Cookie> = serde_json::from_str(&contents)?;
        debug!(
            "Loaded {} cookies from {}",
            cookies.len(),
            self.path.display()
        );
        Ok(cookies)
    }

    fn save(&self, cookies: &[Cookie]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(cookies)?)?;
        debug!("Saved {} cookies to {}", cookies.len(), self.path.display());
        Ok(())
    }
}
