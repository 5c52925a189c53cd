//! Customer name type.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// Returns `true` if `value` has at least [`CustomerName::MIN_LENGTH`]
/// characters after trimming.
#[must_use]
pub fn is_valid_name(value: &str) -> bool {
    value.trim().chars().count() >= CustomerName::MIN_LENGTH
}

/// The customer's full name as it should appear on the payment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct CustomerName(String);

impl CustomerName {
    /// Minimum number of characters after trimming.
    pub const MIN_LENGTH: usize = 2;

    /// Parse a `CustomerName`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidName`] if fewer than two characters remain.
    pub fn parse(s: &str) -> Result<Self, FieldError> {
        if !is_valid_name(s) {
            return Err(FieldError::InvalidName);
        }
        Ok(Self(s.trim().to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
