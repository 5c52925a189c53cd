//! Checkout page route handlers.
//!
//! The page is server-rendered. HTMX keeps the submit control in sync while
//! the customer types and swaps the form in place after a submission; the
//! same endpoints also work as plain form posts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use mp_checkout_core::{CheckoutForm, CheckoutInput, SubmitOutcome};
use serde::Deserialize;
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::Visit;
use crate::services::lock_form;
use crate::state::AppState;

/// Header HTMX sets on every request it issues.
const HX_REQUEST: &str = "hx-request";

// =============================================================================
// View Types
// =============================================================================

/// Snapshot of a draft for rendering.
///
/// Taken under the draft's lock so a render never observes a half-applied
/// update.
#[derive(Debug, Clone)]
pub struct DraftView {
    pub full_name: String,
    pub user_email: String,
    /// Phone in display form, `(DD) NNNNN-NNNN`.
    pub phone: String,
    pub notes: String,
    pub error: Option<String>,
    pub can_submit: bool,
    pub is_loading: bool,
}

impl From<&CheckoutForm> for DraftView {
    fn from(form: &CheckoutForm) -> Self {
        Self {
            full_name: form.full_name().to_string(),
            user_email: form.user_email().to_string(),
            phone: form.formatted_phone(),
            notes: form.notes().to_string(),
            error: form.error_message().map(str::to_string),
            can_submit: form.can_submit(),
            is_loading: form.is_loading(),
        }
    }
}

/// The item shown in the order summary.
#[derive(Debug, Clone)]
pub struct ItemView {
    pub title: String,
    /// Total in display form, e.g. `R$ 149,90`.
    pub total: String,
}

impl ItemView {
    fn from_state(state: &AppState) -> Self {
        let item = &state.config().item;
        Self {
            title: item.title.clone(),
            total: item.price.display(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Full checkout page.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/page.html")]
pub struct CheckoutPageTemplate {
    pub draft: DraftView,
    pub item: ItemView,
}

/// Billing form fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "checkout/_form.html")]
pub struct CheckoutFormTemplate {
    pub draft: DraftView,
}

/// Submit controls fragment, optionally with the reformatted phone input
/// swapped out-of-band (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "checkout/_preview.html")]
pub struct CheckoutPreviewTemplate {
    pub draft: DraftView,
    pub format_phone: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Query options for the preview endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PreviewOptions {
    /// Also return the phone input in display form. Sent when the field
    /// loses focus, never while the customer is typing.
    pub format_phone: bool,
}

/// Display the checkout page.
#[instrument(skip(state), fields(visit = %visit))]
pub async fn page(Visit(visit): Visit, State(state): State<AppState>) -> impl IntoResponse {
    let form = state.visits().form(visit).await;
    let draft = DraftView::from(&*lock_form(&form));

    CheckoutPageTemplate {
        draft,
        item: ItemView::from_state(&state),
    }
}

/// Update the draft and return the submit controls (HTMX).
///
/// Field edits are ignored while a submission is in flight.
#[instrument(skip(state, options, input), fields(visit = %visit))]
pub async fn preview(
    Visit(visit): Visit,
    State(state): State<AppState>,
    Query(options): Query<PreviewOptions>,
    Form(input): Form<CheckoutInput>,
) -> impl IntoResponse {
    let form = state.visits().form(visit).await;
    let draft = {
        let mut draft = lock_form(&form);
        if !draft.is_loading() {
            draft.apply(input);
        }
        DraftView::from(&*draft)
    };

    CheckoutPreviewTemplate {
        draft,
        format_phone: options.format_phone,
    }
}

/// Submit the draft and create a hosted checkout.
///
/// On success the customer is sent to the provider: `303 See Other` for a
/// plain form post, `HX-Redirect` for HTMX. Every other outcome re-renders
/// the form with the draft's current state.
///
/// A dropped connection does not cancel the provider call; the draft stays
/// loading until it returns.
///
/// Without scripting the live check never enables the submit control, so
/// the page offers a plain submit button and the server validates here.
#[instrument(skip(state, headers, input), fields(visit = %visit))]
pub async fn submit(
    Visit(visit): Visit,
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(input): Form<CheckoutInput>,
) -> Response {
    let form = state.visits().form(visit).await;
    {
        let mut draft = lock_form(&form);
        if !draft.is_loading() {
            draft.apply(input);
        }
    }

    let visit_id = visit.to_string();
    add_breadcrumb(
        "checkout",
        "Checkout submitted",
        Some(&[("visit", visit_id.as_str())]),
    );
    let outcome = state.invoker().submit(&form).await;

    let status = match outcome {
        SubmitOutcome::Started(session) => match session.redirect_url {
            Some(url) if is_htmx(&headers) => {
                return AppendHeaders([("HX-Redirect", url)]).into_response();
            }
            Some(url) => return Redirect::to(&url).into_response(),
            None => {
                tracing::warn!(
                    checkout_id = %session.id,
                    "Checkout created without a redirect URL"
                );
                StatusCode::OK
            }
        },
        SubmitOutcome::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SubmitOutcome::Failed => StatusCode::BAD_GATEWAY,
        SubmitOutcome::Busy => StatusCode::CONFLICT,
    };

    let draft = DraftView::from(&*lock_form(&form));
    if is_htmx(&headers) {
        (status, CheckoutFormTemplate { draft }).into_response()
    } else {
        let page = CheckoutPageTemplate {
            draft,
            item: ItemView::from_state(&state),
        };
        (status, page).into_response()
    }
}

fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"true"))
}
