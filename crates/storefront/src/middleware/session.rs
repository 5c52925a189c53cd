//! Session middleware configuration.
//!
//! Sessions only carry the visit ID, so they are kept in process memory and
//! vanish on restart along with the drafts they point to.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::CheckoutConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "mp_checkout_visit";

/// Create the session layer with an in-memory store.
///
/// The cookie expires after the same idle period as the visit's draft.
#[must_use]
pub fn create_session_layer(config: &CheckoutConfig) -> SessionManagerLayer<MemoryStore> {
    let idle = i64::try_from(config.visit_idle_timeout.as_secs()).unwrap_or(i64::MAX);

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(idle),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
