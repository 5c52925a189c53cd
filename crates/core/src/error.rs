//! Error types shared by the checkout flow.
//!
//! [`FieldError`] is what the customer sees: its `Display` output is the
//! pt-BR message rendered in the page's error banner. [`CheckoutCreationError`]
//! is what the collaborator reports; it is logged but never shown.

use thiserror::Error;

/// User-facing message for any failed checkout-creation call.
pub const CHECKOUT_FAILED_MESSAGE: &str =
    "Não foi possível iniciar o checkout agora. Tente novamente em instantes.";

/// A draft field that failed local validation.
///
/// Variants are listed in the order they are checked on submit.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldError {
    /// The e-mail does not have a `local@domain.tld` shape.
    #[error("Digite um e-mail válido para receber a confirmação do pagamento.")]
    InvalidEmail,
    /// The name has fewer than two characters after trimming.
    #[error("Informe seu nome para identificarmos o pagamento corretamente.")]
    InvalidName,
    /// The phone has fewer than ten digits.
    #[error("Informe um telefone/WhatsApp válido (com DDD).")]
    InvalidPhone,
}

impl FieldError {
    /// Name of the form field this error refers to.
    #[must_use]
    pub const fn field(self) -> &'static str {
        match self {
            Self::InvalidEmail => "user_email",
            Self::InvalidName => "full_name",
            Self::InvalidPhone => "phone",
        }
    }
}

/// Errors reported by a [`CheckoutCreator`](crate::CheckoutCreator).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutCreationError {
    /// The request never reached the provider, or the connection failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("provider rejected checkout: {status} - {message}")]
    Rejected {
        /// HTTP status returned by the provider.
        status: u16,
        /// Response body or provider message.
        message: String,
    },

    /// The provider answered but the body could not be understood.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}
