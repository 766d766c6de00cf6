//! Error types for the command-line front end.

use std::path::PathBuf;

/// All errors that can occur while running a command.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("missing credential '{field}': set it in [credentials] or ${env}")]
    MissingField {
        field: &'static str,
        env: &'static str,
    },

    #[error(transparent)]
    Core(#[from] hargreaves::Error),

    #[error("aborted: {0}")]
    Aborted(String),

    #[error("audit log error: {0}")]
    Audit(#[from] std::io::Error),
}

impl Error {
    /// Process exit code: 0 when the user backed out, 2 when the site
    /// refused the deal, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Aborted(_) => 0,
            Error::Core(
                hargreaves::Error::MarketClosed { .. }
                | hargreaves::Error::MarketOrderLiveQuote { .. }
                | hargreaves::Error::OrderFailed { .. }
                | hargreaves::Error::WrongSequence,
            ) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
