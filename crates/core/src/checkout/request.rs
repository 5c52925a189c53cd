//! Normalized payload handed to the checkout-creation collaborator.

use serde::{Deserialize, Serialize};

use crate::types::{CustomerName, Email, PhoneNumber, TrackingId};

/// A validated, normalized checkout request.
///
/// Every field has passed validation: text is trimmed and the phone holds
/// digits only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Per-submission identifier.
    pub tracking_id: TrackingId,
    pub user_email: Email,
    pub full_name: CustomerName,
    /// Digits only, area code included.
    pub phone: PhoneNumber,
    /// Trimmed notes; empty when the customer left none.
    pub notes: String,
}

impl CheckoutRequest {
    /// Notes, or `None` when the customer left the field blank.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        Some(self.notes.as_str()).filter(|n| !n.is_empty())
    }
}
