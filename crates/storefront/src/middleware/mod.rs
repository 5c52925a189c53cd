//! HTTP middleware stack for the checkout storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, framing, caching)
//! 5. Session layer (tower-sessions, in-memory store)
//! 6. Rate limiting (governor, `POST /checkout` only)

pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod visit;

pub use rate_limit::checkout_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use visit::Visit;
