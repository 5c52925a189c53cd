//! The checkout draft and the flow that submits it.
//!
//! # Submission state machine
//!
//! ```text
//! Idle ──submit──▶ Validating ──invalid──▶ Idle (field error set)
//!                      │
//!                    valid
//!                      ▼
//!                 Submitting ──call ok───▶ Idle
//!                      └──────call failed─▶ Idle (generic error set)
//! ```
//!
//! `Submitting` is the single-flight guard: a submit that arrives while the
//! form is submitting is answered with [`SubmitOutcome::Busy`] and does
//! nothing.

mod form;
mod invoker;
mod request;

pub use form::{CheckoutForm, CheckoutInput, SubmissionState, SubmitRejection};
pub use invoker::{
    CheckoutCreator, CheckoutInvoker, CheckoutSession, SharedForm, SubmitOutcome,
};
pub use request::CheckoutRequest;
