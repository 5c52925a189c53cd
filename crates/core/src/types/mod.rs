//! Core types for the checkout page.
//!
//! This module provides validated wrappers for the draft's fields plus the
//! small value types the page and the payment provider exchange.

pub mod email;
pub mod name;
pub mod phone;
pub mod price;
pub mod tracking;

pub use email::{Email, is_valid_email};
pub use name::{CustomerName, is_valid_name};
pub use phone::{PhoneNumber, format_phone_br, is_valid_phone, phone_digits};
pub use price::{CurrencyCode, Price};
pub use tracking::TrackingId;
