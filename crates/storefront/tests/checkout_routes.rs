//! Router-level tests for the checkout page.
//!
//! Drive the full application router with `tower::ServiceExt::oneshot` and a
//! fake checkout collaborator; nothing here talks to Mercado Pago.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use mp_checkout_core::{
    CHECKOUT_FAILED_MESSAGE, CheckoutCreationError, CheckoutCreator, CheckoutRequest,
    CheckoutSession, FieldError, Price,
};
use mp_checkout_storefront::{
    app,
    config::{CheckoutConfig, ItemConfig, MercadoPagoConfig},
    middleware::{checkout_rate_limiter, session::SESSION_COOKIE_NAME},
    state::AppState,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use tokio::sync::Notify;
use tower::ServiceExt;

const REDIRECT_URL: &str = "https://www.mercadopago.com.br/checkout/v1/redirect?pref_id=123-abc";

const VALID_FORM: &str = concat!(
    "full_name=+Maria+Silva+&user_email=maria%40example.com",
    "&phone=%2824%29+99999-9999&notes=CPF+na+nota"
);

fn test_config() -> CheckoutConfig {
    CheckoutConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        item: ItemConfig {
            title: "Checkout Demo".to_string(),
            price: Price::brl(Decimal::from_str("149.90").unwrap()),
            statement_descriptor: None,
        },
        visit_idle_timeout: Duration::from_secs(60),
        trust_proxy: true,
        mercado_pago: MercadoPagoConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            access_token: SecretString::from("APP_USR-unused-in-tests"),
            sandbox: false,
            timeout: Duration::from_secs(1),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

// =============================================================================
// Fake Collaborators
// =============================================================================

/// Records every request and answers with a fixed result.
struct RecordingCreator {
    requests: Mutex<Vec<CheckoutRequest>>,
    result: Result<CheckoutSession, CheckoutCreationError>,
}

impl RecordingCreator {
    fn succeeding(redirect_url: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            result: Ok(CheckoutSession {
                id: "123-abc".to_string(),
                redirect_url: redirect_url.map(str::to_string),
            }),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            result: Err(CheckoutCreationError::Transport("connection refused".to_string())),
        })
    }

    fn requests(&self) -> Vec<CheckoutRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CheckoutCreator for RecordingCreator {
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, CheckoutCreationError> {
        self.requests.lock().unwrap().push(request.clone());
        self.result.clone()
    }
}

/// Blocks inside the call until released.
#[derive(Default)]
struct GatedCreator {
    entered: Notify,
    release: Notify,
    completed: AtomicBool,
}

#[async_trait]
impl CheckoutCreator for GatedCreator {
    async fn create_checkout(
        &self,
        _request: &CheckoutRequest,
    ) -> Result<CheckoutSession, CheckoutCreationError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.completed.store(true, Ordering::SeqCst);
        Ok(CheckoutSession {
            id: "gated".to_string(),
            redirect_url: Some(REDIRECT_URL.to_string()),
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn router(creator: Arc<dyn CheckoutCreator>) -> Router {
    app(AppState::with_creator(test_config(), creator), None)
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, form: &str, cookie: Option<&str>, htmx: bool) -> Request<Body> {
    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if htmx {
        builder = builder.header("HX-Request", "true");
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// The `name=value` pair of the visit cookie set by `response`.
fn visit_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(SESSION_COOKIE_NAME))
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string()
}

async fn start_visit(app: &Router) -> String {
    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    visit_cookie(&response)
}

async fn page_body(app: &Router, cookie: &str) -> String {
    let response = app.clone().oneshot(get("/", Some(cookie))).await.unwrap();
    body_string(response).await
}

// =============================================================================
// Page
// =============================================================================

#[tokio::test]
async fn test_page_renders() {
    let app = router(RecordingCreator::succeeding(Some(REDIRECT_URL)));

    let response = app.oneshot(get("/", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .get(header::CONTENT_SECURITY_POLICY)
            .is_some()
    );
    assert!(response.headers().get("x-request-id").is_some());
    assert!(!visit_cookie(&response).is_empty());

    let body = body_string(response).await;
    assert!(body.contains("Finalize sua compra com rapidez e confiança"));
    assert!(body.contains("Checkout Demo"));
    assert!(body.contains("R$ 149,90"));
    assert!(body.contains("Ir para pagamento"));
    // Empty draft: submit disabled, no error banner.
    assert!(body.contains("disabled>"));
    assert!(!body.contains("role=\"alert\""));
}

#[tokio::test]
async fn test_page_submits_without_scripts() {
    let app = router(RecordingCreator::succeeding(Some(REDIRECT_URL)));

    let body = body_string(app.clone().oneshot(get("/", None)).await.unwrap()).await;
    assert!(body.contains("<noscript><link rel=\"stylesheet\" href=\"/static/css/noscript.css\">"));
    let fallback = body
        .split("<noscript>")
        .nth(2)
        .and_then(|rest| rest.split("</noscript>").next())
        .unwrap();
    assert!(fallback.contains("type=\"submit\""));
    assert!(!fallback.contains("disabled"));

    let css = app
        .oneshot(get("/static/css/noscript.css", None))
        .await
        .unwrap();
    assert_eq!(css.status(), StatusCode::OK);
    assert!(body_string(css).await.contains("#checkout-submit"));
}

#[tokio::test]
async fn test_health() {
    let app = router(RecordingCreator::succeeding(None));

    let response = app.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

// =============================================================================
// Preview
// =============================================================================

#[tokio::test]
async fn test_preview_enables_submit_for_valid_draft() {
    let app = router(RecordingCreator::succeeding(Some(REDIRECT_URL)));

    let response = app
        .oneshot(post_form("/checkout/preview", VALID_FORM, None, true))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("id=\"checkout-controls\""));
    assert!(!body.contains("disabled>"));
    assert!(!body.contains("hx-swap-oob"));
}

#[tokio::test]
async fn test_preview_keeps_submit_disabled_for_short_phone() {
    let app = router(RecordingCreator::succeeding(Some(REDIRECT_URL)));
    let form = "full_name=Maria&user_email=maria%40example.com&phone=249999";

    let response = app
        .oneshot(post_form("/checkout/preview", form, None, true))
        .await
        .unwrap();

    assert!(body_string(response).await.contains("disabled>"));
}

#[tokio::test]
async fn test_preview_formats_phone_on_request() {
    let app = router(RecordingCreator::succeeding(Some(REDIRECT_URL)));
    let form = "full_name=&user_email=&phone=24999999999";

    let response = app
        .oneshot(post_form(
            "/checkout/preview?format_phone=true",
            form,
            None,
            true,
        ))
        .await
        .unwrap();

    let body = body_string(response).await;
    assert!(body.contains("hx-swap-oob=\"true\""));
    assert!(body.contains("value=\"(24) 99999-9999\""));
}

#[tokio::test]
async fn test_draft_survives_page_reload() {
    let app = router(RecordingCreator::succeeding(Some(REDIRECT_URL)));
    let cookie = start_visit(&app).await;

    app.clone()
        .oneshot(post_form("/checkout/preview", VALID_FORM, Some(&cookie), true))
        .await
        .unwrap();
    let response = app.oneshot(get("/", Some(&cookie))).await.unwrap();

    let body = body_string(response).await;
    assert!(body.contains("value=\" Maria Silva \""));
    assert!(body.contains("value=\"(24) 99999-9999\""));
    assert!(body.contains("CPF na nota"));
}

// =============================================================================
// Submit
// =============================================================================

#[tokio::test]
async fn test_submit_redirects_to_provider() {
    let creator = RecordingCreator::succeeding(Some(REDIRECT_URL));
    let app = router(creator.clone());

    let response = app
        .oneshot(post_form("/checkout", VALID_FORM, None, false))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), REDIRECT_URL);

    let requests = creator.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.full_name.as_str(), "Maria Silva");
    assert_eq!(request.user_email.as_str(), "maria@example.com");
    assert_eq!(request.phone.digits(), "24999999999");
    assert_eq!(request.notes, "CPF na nota");
    assert!(request.tracking_id.as_str().starts_with("checkout_"));
}

#[tokio::test]
async fn test_htmx_submit_uses_hx_redirect() {
    let app = router(RecordingCreator::succeeding(Some(REDIRECT_URL)));

    let response = app
        .oneshot(post_form("/checkout", VALID_FORM, None, true))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("HX-Redirect").unwrap(), REDIRECT_URL);
}

#[tokio::test]
async fn test_submit_without_redirect_url_rerenders() {
    let app = router(RecordingCreator::succeeding(None));

    let response = app
        .oneshot(post_form("/checkout", VALID_FORM, None, false))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::LOCATION).is_none());
    assert!(!body_string(response).await.contains("role=\"alert\""));
}

#[tokio::test]
async fn test_invalid_email_is_reported_first() {
    let creator = RecordingCreator::succeeding(Some(REDIRECT_URL));
    let app = router(creator.clone());
    // Every field is invalid; the e-mail message wins.
    let form = "full_name=M&user_email=maria&phone=123";

    let response = app
        .oneshot(post_form("/checkout", form, None, false))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_string(response).await;
    assert!(body.contains(&FieldError::InvalidEmail.to_string()));
    assert!(body.contains("role=\"alert\""));
    assert!(body.contains("value=\"maria\""));
    assert!(creator.requests().is_empty());
}

#[tokio::test]
async fn test_short_name_returns_form_fragment_for_htmx() {
    let creator = RecordingCreator::succeeding(Some(REDIRECT_URL));
    let app = router(creator.clone());
    let form = "full_name=+M+&user_email=maria%40example.com&phone=24999999999";

    let response = app
        .oneshot(post_form("/checkout", form, None, true))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_string(response).await;
    assert!(body.contains(&FieldError::InvalidName.to_string()));
    assert!(body.starts_with("<form"));
    assert!(!body.contains("<html"));
    assert!(creator.requests().is_empty());
}

#[tokio::test]
async fn test_provider_failure_shows_generic_message() {
    let app = router(RecordingCreator::failing());

    let response = app
        .oneshot(post_form("/checkout", VALID_FORM, None, false))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_string(response).await;
    assert!(body.contains(CHECKOUT_FAILED_MESSAGE));
    assert!(body.contains("value=\"maria@example.com\""));
    assert!(!body.contains("connection refused"));
}

#[tokio::test]
async fn test_retry_after_failure_clears_message() {
    let app = router(RecordingCreator::failing());
    let cookie = start_visit(&app).await;

    app.clone()
        .oneshot(post_form("/checkout", VALID_FORM, Some(&cookie), false))
        .await
        .unwrap();
    let form = "full_name=Maria&user_email=nope&phone=24999999999";
    let response = app
        .oneshot(post_form("/checkout", form, Some(&cookie), false))
        .await
        .unwrap();

    let body = body_string(response).await;
    assert!(!body.contains(CHECKOUT_FAILED_MESSAGE));
    assert!(body.contains(&FieldError::InvalidEmail.to_string()));
}

#[tokio::test]
async fn test_submit_while_in_flight_is_rejected() {
    let creator = Arc::new(GatedCreator::default());
    let app = router(creator.clone());
    let cookie = start_visit(&app).await;

    let first = tokio::spawn({
        let app = app.clone();
        let cookie = cookie.clone();
        async move {
            app.oneshot(post_form("/checkout", VALID_FORM, Some(&cookie), false))
                .await
                .unwrap()
        }
    });
    creator.entered.notified().await;

    let second = app
        .clone()
        .oneshot(post_form("/checkout", VALID_FORM, Some(&cookie), false))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert!(body_string(second).await.contains("is-loading"));

    creator.release.notify_one();
    let first = first.await.unwrap();
    assert_eq!(first.status(), StatusCode::SEE_OTHER);

    // Loading is released once the call settles.
    let page = app.oneshot(get("/", Some(&cookie))).await.unwrap();
    assert!(!body_string(page).await.contains("is-loading"));
}

#[tokio::test]
async fn test_client_disconnect_does_not_cancel_checkout() {
    let creator = Arc::new(GatedCreator::default());
    let app = router(creator.clone());
    let cookie = start_visit(&app).await;

    let request = tokio::spawn({
        let app = app.clone();
        let cookie = cookie.clone();
        async move {
            app.oneshot(post_form("/checkout", VALID_FORM, Some(&cookie), true))
                .await
                .unwrap()
        }
    });
    creator.entered.notified().await;

    // The connection goes away while the provider call is in flight.
    request.abort();
    assert!(request.await.unwrap_err().is_cancelled());
    assert!(page_body(&app, &cookie).await.contains("is-loading"));

    creator.release.notify_one();
    tokio::time::timeout(Duration::from_secs(1), async {
        while page_body(&app, &cookie).await.contains("is-loading") {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    assert!(creator.completed.load(Ordering::SeqCst));
    assert!(!page_body(&app, &cookie).await.contains("role=\"alert\""));
}

#[tokio::test]
async fn test_checkout_creation_is_rate_limited() {
    let creator = RecordingCreator::succeeding(Some(REDIRECT_URL));
    let app = app(
        AppState::with_creator(test_config(), creator),
        Some(checkout_rate_limiter(true)),
    );
    let form = "user_email=invalid";

    let mut statuses = Vec::new();
    for _ in 0..6 {
        let request = Request::post("/checkout")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::from(form))
            .unwrap();
        statuses.push(app.clone().oneshot(request).await.unwrap().status());
    }

    assert!(
        statuses[..5]
            .iter()
            .all(|s| *s == StatusCode::UNPROCESSABLE_ENTITY)
    );
    assert_eq!(statuses[5], StatusCode::TOO_MANY_REQUESTS);
}
