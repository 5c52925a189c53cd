//! Services backing the checkout page.
//!
//! - `mercado_pago` - Mercado Pago Checkout Pro API client
//! - `visits` - Per-visit checkout drafts held in memory

pub mod mercado_pago;
pub mod visits;

pub use mercado_pago::{MercadoPagoClient, MercadoPagoError};
pub use visits::{VisitStore, lock_form};
