//! Login credentials.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{AuthError, Result};

/// Username, password, date of birth and secure-number digits.
///
/// Secret material is zeroed on drop and never shown by `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    username: String,
    password: String,
    date_of_birth: String,
    secure_number: String,
}

impl Credentials {
    /// `date_of_birth` is DDMMYY; `secure_number` is the full digit string.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        date_of_birth: impl Into<String>,
        secure_number: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            date_of_birth: date_of_birth.into(),
            secure_number: secure_number.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn date_of_birth(&self) -> &str {
        &self.date_of_birth
    }

    /// Secure-number digit at a 1-based `position`.
    pub fn secure_digit(&self, position: usize) -> Result<char> {
        position
            .checked_sub(1)
            .and_then(|i| self.secure_number.chars().nth(i))
            .ok_or_else(|| AuthError::SecureNumberOutOfRange { position }.into())
    }

    /// Values that must never appear in recorded traffic.
    pub fn sensitive_values(&self) -> Vec<&str> {
        [
            self.username.as_str(),
            self.password.as_str(),
            self.date_of_birth.as_str(),
            self.secure_number.as_str(),
        ]
        .into_iter()
        .filter(|v| !v.is_empty())
        .collect()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"***")
            .field("password", &"***")
            .field("date_of_birth", &"***")
            .field("secure_number", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn creds() -> Credentials {
        Credentials::new("jbloggs", "hunter2", "010180", "246813")
    }

    #[test]
    fn secure_digit_is_one_based() {
        let c = creds();
        assert_eq!(c.secure_digit(1).unwrap(), '2');
        assert_eq!(c.secure_digit(6).unwrap(), '3');
    }

    #[test]
    fn secure_digit_out_of_range() {
        let c = creds();
        for position in [0, 7] {
            assert!(matches!(
                c.secure_digit(position),
                Err(Error::Authentication(AuthError::SecureNumberOutOfRange { .. }))
            ));
        }
    }

    #[test]
    fn debug_redacts() {
        let shown = format!("{:?}", creds());
        assert!(!shown.contains("jbloggs"));
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("246813"));
    }
}
