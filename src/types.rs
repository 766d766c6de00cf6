//! Small value types shared across the dealing journey.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Buy or sell. The form value is the capitalised word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn form_value(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.form_value())
    }
}

/// Whether an order amount is a cash value or a number of units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmountKind {
    Value,
    Quantity,
}

impl AmountKind {
    pub fn form_value(&self) -> &'static str {
        match self {
            AmountKind::Value => "value",
            AmountKind::Quantity => "quantity",
        }
    }
}

impl fmt::Display for AmountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.form_value())
    }
}

/// Security category as reported by search. Overseas securities use the
/// `_overseas` dealing endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryCode {
    /// "E": UK equity.
    Equity,
    /// "O": overseas equity.
    Overseas,
    /// "H": investment trust.
    Trust,
    Other(String),
}

impl CategoryCode {
    pub fn from_code(code: &str) -> Self {
        match code {
            "E" => CategoryCode::Equity,
            "O" => CategoryCode::Overseas,
            "H" => CategoryCode::Trust,
            other => CategoryCode::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            CategoryCode::Equity => "E",
            CategoryCode::Overseas => "O",
            CategoryCode::Trust => "H",
            CategoryCode::Other(code) => code,
        }
    }

    pub fn is_overseas(&self) -> bool {
        matches!(self, CategoryCode::Overseas)
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Opaque per-page `hl_vt` nonce. Echoed back unchanged on the next step
/// of the same flow.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurityToken(String);

impl SecurityToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecurityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecurityToken({})", self.0)
    }
}

impl fmt::Display for SecurityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Format an amount the way the site's own forms post it: integral values
/// without a fractional part, everything else as-is.
pub(crate) fn form_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
