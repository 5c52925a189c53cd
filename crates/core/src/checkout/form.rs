//! The per-visit checkout draft.

use serde::Deserialize;

use super::CheckoutRequest;
use crate::error::{CHECKOUT_FAILED_MESSAGE, FieldError};
use crate::types::{
    CustomerName, Email, PhoneNumber, TrackingId, format_phone_br, is_valid_email, is_valid_name,
    phone,
};

/// Where the draft is in the submission flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubmissionState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// A submit request is re-checking the fields.
    Validating,
    /// The checkout-creation call is in flight.
    Submitting,
}

/// Why [`CheckoutForm::begin_submit`] did not produce a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejection {
    /// Another submission is already in flight.
    Busy,
    /// A field failed validation. The error message has been set.
    Invalid(FieldError),
}

/// Raw field values as posted by the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CheckoutInput {
    pub full_name: String,
    pub user_email: String,
    pub phone: String,
    pub notes: String,
}

/// The Checkout Request Draft: four editable fields, the submission state,
/// and the last error shown to the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    full_name: String,
    user_email: String,
    /// Digits only, at most [`phone::MAX_DIGITS`].
    phone: String,
    notes: String,
    state: SubmissionState,
    error_message: Option<String>,
}

impl CheckoutForm {
    /// Create an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Field access
    // =========================================================================

    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[must_use]
    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    /// The stored phone digits.
    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// The phone as displayed in the input, e.g. `(21) 99999-8888`.
    #[must_use]
    pub fn formatted_phone(&self) -> String {
        format_phone_br(&self.phone)
    }

    #[must_use]
    pub const fn state(&self) -> SubmissionState {
        self.state
    }

    /// `true` while the checkout-creation call is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.state, SubmissionState::Submitting)
    }

    /// The message for the error banner, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn set_full_name(&mut self, value: impl Into<String>) {
        self.full_name = value.into();
    }

    pub fn set_user_email(&mut self, value: impl Into<String>) {
        self.user_email = value.into();
    }

    /// Store the digits of `raw`, dropping formatting and anything past
    /// [`phone::MAX_DIGITS`].
    pub fn set_phone(&mut self, raw: &str) {
        self.phone = phone::phone_digits(raw)
            .chars()
            .take(phone::MAX_DIGITS)
            .collect();
    }

    pub fn set_notes(&mut self, value: impl Into<String>) {
        self.notes = value.into();
    }

    /// Replace all four fields with the posted values.
    ///
    /// The submission state and error message are left as they are.
    pub fn apply(&mut self, input: CheckoutInput) {
        self.set_full_name(input.full_name);
        self.set_user_email(input.user_email);
        self.set_phone(&input.phone);
        self.set_notes(input.notes);
    }

    // =========================================================================
    // Validity
    // =========================================================================

    /// Check the fields in submit order: e-mail, then name, then phone.
    ///
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), FieldError> {
        self.parse_fields().map(|_| ())
    }

    /// Parse the fields into their validated types, in submit order.
    fn parse_fields(&self) -> Result<(Email, CustomerName, PhoneNumber), FieldError> {
        let email = Email::parse(&self.user_email)?;
        let name = CustomerName::parse(&self.full_name)?;
        let phone = PhoneNumber::parse(&self.phone)?;
        Ok((email, name, phone))
    }

    /// Whether the submit control should be enabled.
    ///
    /// Recomputed from the current fields on every call.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        is_valid_email(&self.user_email)
            && is_valid_name(&self.full_name)
            && phone::is_valid_phone(&self.phone)
            && !self.is_loading()
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Start a submission.
    ///
    /// Clears the error message and re-validates every field. On success the
    /// draft enters [`SubmissionState::Submitting`] and the normalized
    /// request, carrying a fresh [`TrackingId`], is returned. On a field error
    /// the field-specific message is set and the draft returns to idle.
    ///
    /// # Errors
    ///
    /// - [`SubmitRejection::Busy`] if a submission is already in flight; the
    ///   draft is left untouched.
    /// - [`SubmitRejection::Invalid`] if a field failed validation.
    pub fn begin_submit(&mut self) -> Result<CheckoutRequest, SubmitRejection> {
        if self.is_loading() {
            return Err(SubmitRejection::Busy);
        }

        self.error_message = None;
        self.state = SubmissionState::Validating;

        let (user_email, full_name, phone) = match self.parse_fields() {
            Ok(fields) => fields,
            Err(field) => {
                self.error_message = Some(field.to_string());
                self.state = SubmissionState::Idle;
                return Err(SubmitRejection::Invalid(field));
            }
        };

        self.state = SubmissionState::Submitting;
        Ok(CheckoutRequest {
            tracking_id: TrackingId::generate(),
            user_email,
            full_name,
            phone,
            notes: self.notes.trim().to_owned(),
        })
    }

    /// Settle an in-flight submission.
    ///
    /// A failed call sets the generic retry message. Field values are never
    /// touched.
    pub fn finish_submit(&mut self, succeeded: bool) {
        self.state = SubmissionState::Idle;
        if !succeeded {
            self.error_message = Some(CHECKOUT_FAILED_MESSAGE.to_owned());
        }
    }
}
