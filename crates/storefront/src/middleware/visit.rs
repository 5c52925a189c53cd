//! Visit extractor.
//!
//! Resolves the visit ID stored in the session, issuing a new one on the
//! first request of a visit.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::AppError;

/// Session key holding the visit ID.
pub const VISIT_ID_KEY: &str = "visit_id";

/// The current visit.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Visit(visit): Visit, State(state): State<AppState>) -> impl IntoResponse {
///     let form = state.visits().form(visit).await;
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit(pub Uuid);

impl<S> FromRequestParts<S> for Visit
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        if let Some(visit) = session.get::<Uuid>(VISIT_ID_KEY).await? {
            return Ok(Self(visit));
        }

        let visit = Uuid::new_v4();
        session.insert(VISIT_ID_KEY, visit).await?;
        tracing::debug!(%visit, "New visit");
        Ok(Self(visit))
    }
}
