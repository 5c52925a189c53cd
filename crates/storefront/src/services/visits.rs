//! In-memory checkout drafts, one per visit.
//!
//! A visit is identified by a UUID stored in the session cookie. Drafts live
//! only in this process and are dropped once a visit has been idle for the
//! configured time; there is no persistence.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use moka::future::Cache;
use mp_checkout_core::{CheckoutForm, SharedForm};
use uuid::Uuid;

/// Lock a draft, recovering it if a previous holder panicked.
///
/// Never hold the guard across an `.await`.
pub fn lock_form(form: &SharedForm) -> MutexGuard<'_, CheckoutForm> {
    form.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Upper bound on concurrently held drafts.
const MAX_VISITS: u64 = 10_000;

/// Store of per-visit checkout drafts.
#[derive(Clone)]
pub struct VisitStore {
    forms: Cache<Uuid, SharedForm>,
}

impl VisitStore {
    /// Create a store that drops drafts idle for longer than `idle_timeout`.
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            forms: Cache::builder()
                .max_capacity(MAX_VISITS)
                .time_to_idle(idle_timeout)
                .build(),
        }
    }

    /// The draft for `visit`, created empty on first access.
    pub async fn form(&self, visit: Uuid) -> SharedForm {
        self.forms
            .get_with(visit, async { Arc::new(Mutex::new(CheckoutForm::new())) })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_visit_shares_draft() {
        let store = VisitStore::new(Duration::from_secs(60));
        let visit = Uuid::new_v4();

        lock_form(&store.form(visit).await).set_full_name("Maria");
        let again = store.form(visit).await;

        assert_eq!(lock_form(&again).full_name(), "Maria");
    }

    #[tokio::test]
    async fn test_visits_are_isolated() {
        let store = VisitStore::new(Duration::from_secs(60));

        lock_form(&store.form(Uuid::new_v4()).await).set_full_name("Maria");
        let other = store.form(Uuid::new_v4()).await;

        assert_eq!(lock_form(&other).full_name(), "");
    }
}
