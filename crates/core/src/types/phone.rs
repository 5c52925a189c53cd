//! Brazilian phone numbers: digit extraction, display formatting, validation.
//!
//! The draft stores only digits. The display form `(DD) XXXXX-XXXX` is
//! re-derived from them every time the field is rendered, so feeding an
//! already formatted value back through [`format_phone_br`] is a no-op.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// Digits kept from user input: two-digit area code plus up to nine digits.
pub const MAX_DIGITS: usize = 11;

/// Digits required for a phone to be accepted (area code plus eight digits).
pub const MIN_DIGITS: usize = 10;

const AREA_CODE_LEN: usize = 2;
const FIRST_GROUP_END: usize = 7;

/// Strip every character that is not an ASCII digit.
#[must_use]
pub fn phone_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Format raw input progressively as `(DD) XXXXX-XXXX`.
///
/// Non-digits are dropped and the result is truncated to [`MAX_DIGITS`]
/// digits first.
///
/// ```
/// use mp_checkout_core::format_phone_br;
///
/// assert_eq!(format_phone_br(""), "");
/// assert_eq!(format_phone_br("2"), "(2");
/// assert_eq!(format_phone_br("219"), "(21) 9");
/// assert_eq!(format_phone_br("21999998888"), "(21) 99999-8888");
/// assert_eq!(format_phone_br("(21) 99999-8888"), "(21) 99999-8888");
/// ```
#[must_use]
pub fn format_phone_br(raw: &str) -> String {
    let digits: String = phone_digits(raw).chars().take(MAX_DIGITS).collect();

    match digits.len() {
        0 => String::new(),
        1..=AREA_CODE_LEN => format!("({digits}"),
        len => {
            let (area_code, rest) = digits.split_at(AREA_CODE_LEN);
            if len <= FIRST_GROUP_END {
                format!("({area_code}) {rest}")
            } else {
                let (first, second) = rest.split_at(FIRST_GROUP_END - AREA_CODE_LEN);
                format!("({area_code}) {first}-{second}")
            }
        }
    }
}

/// Returns `true` if `value` contains at least [`MIN_DIGITS`] digits.
#[must_use]
pub fn is_valid_phone(value: &str) -> bool {
    value.chars().filter(char::is_ascii_digit).count() >= MIN_DIGITS
}

/// A phone number with area code, stored as digits only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse a `PhoneNumber` from any user input.
    ///
    /// Formatting characters are dropped and at most [`MAX_DIGITS`] digits
    /// are kept.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidPhone`] if fewer than [`MIN_DIGITS`]
    /// digits are present.
    pub fn parse(s: &str) -> Result<Self, FieldError> {
        if !is_valid_phone(s) {
            return Err(FieldError::InvalidPhone);
        }
        Ok(Self(phone_digits(s).chars().take(MAX_DIGITS).collect()))
    }

    /// All digits, area code included.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// The two-digit area code (DDD).
    #[must_use]
    pub fn area_code(&self) -> &str {
        self.0.get(..AREA_CODE_LEN).unwrap_or_default()
    }

    /// The subscriber number without the area code.
    #[must_use]
    pub fn number(&self) -> &str {
        self.0.get(AREA_CODE_LEN..).unwrap_or_default()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_phone_br(&self.0))
    }
}
