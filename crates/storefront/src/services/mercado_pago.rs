//! Mercado Pago API client for hosted checkout creation.
//!
//! Creates a Checkout Pro *preference* for each submission. The preference's
//! `init_point` is the hosted checkout the customer is redirected to.

use async_trait::async_trait;
use mp_checkout_core::{CheckoutCreationError, CheckoutCreator, CheckoutRequest, CheckoutSession};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::{ItemConfig, MercadoPagoConfig};

/// Header Mercado Pago uses to deduplicate retried requests.
const IDEMPOTENCY_HEADER: &str = "X-Idempotency-Key";

/// Longest statement descriptor Mercado Pago accepts.
const MAX_STATEMENT_DESCRIPTOR: usize = 22;

/// Errors that can occur when interacting with the Mercado Pago API.
#[derive(Debug, Error)]
pub enum MercadoPagoError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<MercadoPagoError> for CheckoutCreationError {
    fn from(err: MercadoPagoError) -> Self {
        match err {
            MercadoPagoError::Http(e) => Self::Transport(e.to_string()),
            MercadoPagoError::Api { status, message } => Self::Rejected { status, message },
            MercadoPagoError::Parse(msg) => Self::InvalidResponse(msg),
        }
    }
}

/// Mercado Pago API client.
#[derive(Clone)]
pub struct MercadoPagoClient {
    client: reqwest::Client,
    api_url: String,
    sandbox: bool,
    item: ItemConfig,
}

impl MercadoPagoClient {
    /// Create a new Mercado Pago API client.
    ///
    /// # Errors
    ///
    /// Returns error if the access token is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &MercadoPagoConfig, item: ItemConfig) -> Result<Self, MercadoPagoError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.access_token.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| MercadoPagoError::Parse(format!("Invalid access token format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            sandbox: config.sandbox,
            item,
        })
    }

    /// Create a checkout preference for `request`.
    ///
    /// The tracking ID is sent as the idempotency key, so a retried request
    /// for the same submission cannot create a second preference.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the API rejects it, or the
    /// response cannot be parsed.
    #[instrument(skip(self, request), fields(tracking_id = %request.tracking_id))]
    pub async fn create_preference(
        &self,
        request: &CheckoutRequest,
    ) -> Result<Preference, MercadoPagoError> {
        let url = format!("{}/checkout/preferences", self.api_url);
        let body = PreferenceRequest::new(request, &self.item);

        let response = self
            .client
            .post(&url)
            .header(IDEMPOTENCY_HEADER, request.tracking_id.as_str())
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MercadoPagoError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Preference>()
            .await
            .map_err(|e| MercadoPagoError::Parse(e.to_string()))
    }

    /// The URL the customer should be sent to for `preference`.
    fn redirect_url(&self, preference: &Preference) -> Option<String> {
        if self.sandbox {
            preference
                .sandbox_init_point
                .clone()
                .or_else(|| preference.init_point.clone())
        } else {
            preference.init_point.clone()
        }
    }
}

#[async_trait]
impl CheckoutCreator for MercadoPagoClient {
    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, CheckoutCreationError> {
        let preference = self.create_preference(request).await?;
        let redirect_url = self.redirect_url(&preference);
        Ok(CheckoutSession {
            id: preference.id,
            redirect_url,
        })
    }
}

// =============================================================================
// Wire Types
// =============================================================================

/// Body of `POST /checkout/preferences`.
#[derive(Debug, Serialize)]
pub struct PreferenceRequest {
    pub items: Vec<PreferenceItem>,
    pub payer: Payer,
    pub external_reference: String,
    pub metadata: PreferenceMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement_descriptor: Option<String>,
}

impl PreferenceRequest {
    /// Build the preference body for a validated request.
    #[must_use]
    pub fn new(request: &CheckoutRequest, item: &ItemConfig) -> Self {
        Self {
            items: vec![PreferenceItem {
                id: request.tracking_id.to_string(),
                title: item.title.clone(),
                quantity: 1,
                currency_id: item.price.currency_code.code(),
                unit_price: item.price.amount,
            }],
            payer: Payer {
                name: request.full_name.to_string(),
                email: request.user_email.to_string(),
                phone: PayerPhone {
                    area_code: request.phone.area_code().to_string(),
                    number: request.phone.number().to_string(),
                },
            },
            external_reference: request.tracking_id.to_string(),
            metadata: PreferenceMetadata {
                tracking_id: request.tracking_id.to_string(),
                notes: request.notes().map(str::to_string),
            },
            statement_descriptor: item
                .statement_descriptor
                .as_ref()
                .map(|d| d.chars().take(MAX_STATEMENT_DESCRIPTOR).collect()),
        }
    }
}

/// A line item of the preference.
#[derive(Debug, Serialize)]
pub struct PreferenceItem {
    pub id: String,
    pub title: String,
    pub quantity: u32,
    pub currency_id: &'static str,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

/// The paying customer.
#[derive(Debug, Serialize)]
pub struct Payer {
    pub name: String,
    pub email: String,
    pub phone: PayerPhone,
}

/// Customer phone split the way Mercado Pago expects it.
#[derive(Debug, Serialize)]
pub struct PayerPhone {
    pub area_code: String,
    pub number: String,
}

/// Free-form data echoed back in provider notifications.
#[derive(Debug, Serialize)]
pub struct PreferenceMetadata {
    pub tracking_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Preference resource returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Preference {
    pub id: String,
    #[serde(default)]
    pub init_point: Option<String>,
    #[serde(default)]
    pub sandbox_init_point: Option<String>,
}
