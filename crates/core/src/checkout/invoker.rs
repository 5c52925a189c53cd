//! Checkout Invoker: validate, call the collaborator, report back.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use super::{CheckoutForm, CheckoutRequest, SubmitRejection};
use crate::error::{CheckoutCreationError, FieldError};

/// A draft shared between the requests of one visit.
pub type SharedForm = Arc<Mutex<CheckoutForm>>;

/// The external checkout-creation call.
///
/// Implementations talk to the payment provider. The invoker never looks
/// inside the returned session; it only hands it back to the caller, which
/// is responsible for sending the customer to the hosted checkout.
#[async_trait]
pub trait CheckoutCreator: Send + Sync {
    /// Create a hosted checkout for `request`.
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, CheckoutCreationError>;
}

/// A hosted checkout created by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider-side identifier.
    pub id: String,
    /// Where the customer completes the payment.
    pub redirect_url: Option<String>,
}

/// Result of one submit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A submission was already in flight; nothing happened.
    Busy,
    /// A field failed validation; the collaborator was not called.
    Invalid(FieldError),
    /// The collaborator created a checkout.
    Started(CheckoutSession),
    /// The collaborator failed; the generic retry message is set.
    Failed,
}

/// Runs the submission state machine against a shared draft.
///
/// The draft's lock is held only while its state changes, never across the
/// collaborator call, so readers see the loading state while it is in
/// flight.
#[derive(Clone)]
pub struct CheckoutInvoker {
    creator: Arc<dyn CheckoutCreator>,
}

impl CheckoutInvoker {
    /// Create an invoker that delegates to `creator`.
    #[must_use]
    pub fn new(creator: Arc<dyn CheckoutCreator>) -> Self {
        Self { creator }
    }

    /// Submit the draft in `form`.
    ///
    /// Once started, the collaborator call runs on its own task and always
    /// settles the draft, even if this future is dropped before it returns.
    /// Must be called from within a Tokio runtime.
    pub async fn submit(&self, form: &SharedForm) -> SubmitOutcome {
        let begun = lock(form).begin_submit();
        let request = match begun {
            Ok(request) => request,
            Err(SubmitRejection::Busy) => {
                tracing::debug!("Submit ignored, checkout already in flight");
                return SubmitOutcome::Busy;
            }
            Err(SubmitRejection::Invalid(field)) => {
                tracing::debug!(field = field.field(), "Checkout draft rejected");
                return SubmitOutcome::Invalid(field);
            }
        };

        let creator = Arc::clone(&self.creator);
        let in_flight = InFlight::new(Arc::clone(form));
        let call = tokio::spawn(
            async move {
                tracing::info!(tracking_id = %request.tracking_id, "Creating checkout");
                match creator.create_checkout(&request).await {
                    Ok(session) => {
                        in_flight.settle(true);
                        tracing::info!(
                            tracking_id = %request.tracking_id,
                            checkout_id = %session.id,
                            "Checkout created"
                        );
                        SubmitOutcome::Started(session)
                    }
                    Err(e) => {
                        in_flight.settle(false);
                        tracing::warn!(
                            tracking_id = %request.tracking_id,
                            error = %e,
                            "Checkout creation failed"
                        );
                        SubmitOutcome::Failed
                    }
                }
            }
            .in_current_span(),
        );

        call.await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "Checkout task did not complete");
            SubmitOutcome::Failed
        })
    }
}

/// Lock the draft, recovering it if a previous holder panicked.
fn lock(form: &Mutex<CheckoutForm>) -> MutexGuard<'_, CheckoutForm> {
    form.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Settles the draft as failed if the call task ends without settling it.
struct InFlight {
    form: SharedForm,
    settled: bool,
}

impl InFlight {
    fn new(form: SharedForm) -> Self {
        Self {
            form,
            settled: false,
        }
    }

    fn settle(mut self, succeeded: bool) {
        lock(&self.form).finish_submit(succeeded);
        self.settled = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.settled {
            lock(&self.form).finish_submit(false);
        }
    }
}
