//! Application state shared across handlers.

use std::sync::Arc;

use mp_checkout_core::{CheckoutCreator, CheckoutInvoker};

use crate::config::CheckoutConfig;
use crate::services::{MercadoPagoClient, MercadoPagoError, VisitStore};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: CheckoutConfig,
    invoker: CheckoutInvoker,
    visits: VisitStore,
}

impl AppState {
    /// Create the application state backed by the Mercado Pago API.
    ///
    /// # Errors
    ///
    /// Returns an error if the Mercado Pago client cannot be built.
    pub fn new(config: CheckoutConfig) -> Result<Self, MercadoPagoError> {
        let client = MercadoPagoClient::new(&config.mercado_pago, config.item.clone())?;
        Ok(Self::with_creator(config, Arc::new(client)))
    }

    /// Create the application state with any checkout collaborator.
    #[must_use]
    pub fn with_creator(config: CheckoutConfig, creator: Arc<dyn CheckoutCreator>) -> Self {
        let visits = VisitStore::new(config.visit_idle_timeout);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                invoker: CheckoutInvoker::new(creator),
                visits,
            }),
        }
    }

    /// Get a reference to the checkout configuration.
    #[must_use]
    pub fn config(&self) -> &CheckoutConfig {
        &self.inner.config
    }

    /// Get the submission invoker.
    #[must_use]
    pub fn invoker(&self) -> &CheckoutInvoker {
        &self.inner.invoker
    }

    /// Get the per-visit draft store.
    #[must_use]
    pub fn visits(&self) -> &VisitStore {
        &self.inner.visits
    }
}
