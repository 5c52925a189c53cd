//! Mercado Pago Checkout Core - Domain types and submission flow.
//!
//! This crate holds everything the checkout page knows about a customer's
//! draft, independent of how the page is served:
//!
//! - Field formatting and validation (phone, e-mail, name)
//! - The per-visit [`CheckoutForm`] and its derived validity
//! - The [`CheckoutInvoker`] that turns a valid draft into one call to a
//!   [`CheckoutCreator`]
//!
//! # Architecture
//!
//! The core crate contains only types, traits, and pure functions - no HTTP
//! clients and no templates. The storefront binary provides the concrete
//! [`CheckoutCreator`] and renders the page.
//!
//! # Modules
//!
//! - [`types`] - Validated newtypes, phone formatting, prices, tracking IDs
//! - [`checkout`] - Form state, payload, collaborator contract, invoker
//! - [`error`] - Field validation errors and collaborator errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod error;
pub mod types;

pub use checkout::{
    CheckoutCreator, CheckoutForm, CheckoutInput, CheckoutInvoker, CheckoutRequest,
    CheckoutSession, SharedForm, SubmissionState, SubmitOutcome, SubmitRejection,
};
pub use error::{CHECKOUT_FAILED_MESSAGE, CheckoutCreationError, FieldError};
pub use types::*;
