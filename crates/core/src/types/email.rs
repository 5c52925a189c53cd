//! E-mail address type.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// `local@domain.tld`: no whitespace or extra `@` anywhere, and at least two
/// characters after the last dot of the domain.
static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").expect("e-mail pattern is a valid regex")
});

/// Returns `true` if `value`, once trimmed, has a basic e-mail shape.
///
/// No DNS or deliverability check is made.
///
/// ```
/// use mp_checkout_core::is_valid_email;
///
/// assert!(is_valid_email(" maria@example.com "));
/// assert!(!is_valid_email("maria@example"));
/// ```
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_SHAPE.is_match(value.trim())
}

/// A trimmed e-mail address that passed [`is_valid_email`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parse an `Email` from user input, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidEmail`] if the trimmed input does not have
    /// a `local@domain.tld` shape.
    pub fn parse(s: &str) -> Result<Self, FieldError> {
        if !is_valid_email(s) {
            return Err(FieldError::InvalidEmail);
        }
        Ok(Self(s.trim().to_owned()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
