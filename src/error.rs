//! Error types for the dealing journey.
//!
//! Two variants are routed signals rather than failures:
//! [`Error::MarketClosed`] and [`Error::MarketOrderLiveQuote`] tell the smart
//! deal orchestrator to retry through the manual (fill-or-kill) flow.

use std::fmt;

/// The login step at which the site rejected the supplied credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginStep {
    /// Username and date of birth.
    UsernameAndDateOfBirth,
    /// Password and secure-number digits.
    PasswordAndSecureNumber,
}

impl fmt::Display for LoginStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginStep::UsernameAndDateOfBirth => write!(f, "username/date-of-birth step"),
            LoginStep::PasswordAndSecureNumber => write!(f, "password/secure-number step"),
        }
    }
}

/// Reasons the login state machine ends in `Failed`.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("login security token (hl_vt) not found")]
    TokenNotFound,

    #[error("credentials rejected at the {step}")]
    CredentialsRejected { step: LoginStep },

    #[error("secure number position {position} is outside the configured digits")]
    SecureNumberOutOfRange { position: usize },

    #[error("requested secure number positions not found: {0}")]
    SecureNumbersNotFound(String),
}

/// All errors that can occur while talking to the site.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    #[error("session error: {0}")]
    Session(String),

    #[error(
        "market closed (fill or kill available: {can_fill_or_kill}, limit available: {can_limit})"
    )]
    MarketClosed {
        can_fill_or_kill: bool,
        can_limit: bool,
    },

    #[error("live quote unavailable: {message}")]
    MarketOrderLiveQuote { message: String, body: String },

    #[error("order failed: {message}")]
    OrderFailed { message: String, body: String },

    #[error("cancel pending order failed: {message}")]
    CancelPendingOrder { message: String, body: String },

    #[error("expected exactly one matching security, found {count}")]
    SearchFilter { count: usize },

    #[error("deal out of sequence: another account is open in this session")]
    WrongSequence,

    #[error("SEDOL mismatch: expected {expected}, found {found}")]
    SedolMismatch { expected: String, found: String },

    #[error("account {0} not found")]
    AccountNotFound(u32),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{url} returned HTTP {status}")]
    Http { status: u16, url: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to parse {page}: {detail}")]
    Parse { page: &'static str, detail: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn parse(page: &'static str, detail: impl Into<String>) -> Self {
        Error::Parse {
            page,
            detail: detail.into(),
        }
    }

    pub(crate) fn order_failed(message: impl Into<String>, body: &str) -> Self {
        Error::OrderFailed {
            message: message.into(),
            body: body.to_string(),
        }
    }

    /// True for the two outcomes that route a deal to the manual flow.
    pub fn is_fallback_signal(&self) -> bool {
        matches!(
            self,
            Error::MarketClosed { .. } | Error::MarketOrderLiveQuote { .. }
        )
    }

    /// Raw response body carried by order and cancellation failures.
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::MarketOrderLiveQuote { body, .. }
            | Error::OrderFailed { body, .. }
            | Error::CancelPendingOrder { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
