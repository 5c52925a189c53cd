//! Per-submission tracking identifiers.
//!
//! A tracking ID is sent with every checkout-creation call so the provider
//! side can correlate the attempt. It doubles as the idempotency key of the
//! outbound request, so two submissions must never share one.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A per-submission identifier of the form `checkout_<unix-millis>_<hex8>`.
///
/// The random suffix keeps identifiers distinct when two submissions land in
/// the same millisecond.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingId(String);

impl TrackingId {
    /// Fixed prefix of every tracking ID.
    pub const PREFIX: &'static str = "checkout";

    /// Generate a fresh tracking ID from the wall clock and a random suffix.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_parts(chrono::Utc::now().timestamp_millis(), rand::random())
    }

    /// Build a tracking ID from a timestamp and suffix.
    #[must_use]
    pub fn from_parts(timestamp_millis: i64, suffix: u32) -> Self {
        Self(format!("{}_{timestamp_millis}_{suffix:08x}", Self::PREFIX))
    }

    /// Returns the tracking ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TrackingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
