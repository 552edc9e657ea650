//! PayPal Orders API client.
//!
//! # Architecture
//!
//! - OAuth client-credentials token, cached in-process until shortly before
//!   expiry
//! - Capture is the payment gate: an order is recorded only after PayPal
//!   reports the capture `COMPLETED`
//! - All requests carry a hard timeout; a timed-out capture is treated as not
//!   completed, never as completed

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::config::PayPalConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Refresh the cached token this long before PayPal's stated expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Errors that can occur when talking to PayPal.
#[derive(Debug, Error)]
pub enum PayPalError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// PayPal returned a non-success status.
    #[error("PayPal returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Request did not complete within the timeout.
    #[error("PayPal request timed out")]
    Timeout,

    /// Capture response had no usable capture record.
    #[error("capture response missing capture record")]
    MissingCapture,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct CaptureResponse {
    status: String,
    #[serde(default)]
    purchase_units: Vec<PurchaseUnit>,
}

#[derive(Debug, Deserialize)]
struct PurchaseUnit {
    #[serde(default)]
    payments: Option<Payments>,
}

#[derive(Debug, Deserialize)]
struct Payments {
    #[serde(default)]
    captures: Vec<Capture>,
}

#[derive(Debug, Deserialize)]
struct Capture {
    id: String,
    status: String,
}

/// Result of a capture call.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    /// PayPal's capture id, recorded on the order for reconciliation.
    pub capture_id: String,
}

struct CachedToken {
    token: String,
    expires_at: std::time::Instant,
}

/// Client for the PayPal Orders v2 API.
#[derive(Clone)]
pub struct PayPalClient {
    inner: Arc<PayPalClientInner>,
}

struct PayPalClientInner {
    client: reqwest::Client,
    api_base: String,
    client_id: String,
    client_secret: SecretString,
    token: Mutex<Option<CachedToken>>,
}

impl PayPalClient {
    /// Create a new PayPal client.
    ///
    /// # Errors
    ///
    /// Returns `PayPalError::Http` if the underlying HTTP client cannot be
    /// built.
    pub fn new(config: &PayPalConfig) -> Result<Self, PayPalError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(PayPalClientInner {
                client,
                api_base: config.api_base.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                token: Mutex::new(None),
            }),
        })
    }

    /// Get a valid OAuth access token, refreshing through the
    /// client-credentials grant when the cached one is absent or stale.
    async fn access_token(&self) -> Result<String, PayPalError> {
        let mut guard = self.inner.token.lock().await;

        if let Some(cached) = guard.as_ref()
            && cached.expires_at > std::time::Instant::now()
        {
            return Ok(cached.token.clone());
        }

        debug!("Refreshing PayPal access token");

        let response = self
            .inner
            .client
            .post(format!("{}/v1/oauth2/token", self.inner.api_base))
            .basic_auth(
                &self.inner.client_id,
                Some(self.inner.client_secret.expose_secret()),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(map_timeout)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PayPalError::Status { status, body });
        }

        let token: TokenResponse = response.json().await?;

        let ttl = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *guard = Some(CachedToken {
            token: token.access_token.clone(),
            expires_at: std::time::Instant::now() + ttl,
        });

        Ok(token.access_token)
    }

    /// Capture an approved PayPal order.
    ///
    /// Succeeds only when PayPal reports the capture `COMPLETED`. Any other
    /// status, a missing capture record, or a timeout is an error, so callers
    /// never record an order for money that did not move.
    ///
    /// # Errors
    ///
    /// Returns `PayPalError` when the capture cannot be confirmed.
    #[instrument(skip(self))]
    pub async fn capture_order(&self, paypal_order_id: &str) -> Result<CaptureResult, PayPalError> {
        let token = self.access_token().await?;

        let response = self
            .inner
            .client
            .post(format!(
                "{}/v2/checkout/orders/{paypal_order_id}/capture",
                self.inner.api_base
            ))
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .body("{}")
            .send()
            .await
            .map_err(map_timeout)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PayPalError::Status { status, body });
        }

        let capture: CaptureResponse = response.json().await?;

        if capture.status != "COMPLETED" {
            return Err(PayPalError::Status {
                status,
                body: format!("capture status was {}", capture.status),
            });
        }

        let record = capture
            .purchase_units
            .into_iter()
            .filter_map(|u| u.payments)
            .flat_map(|p| p.captures)
            .find(|c| c.status == "COMPLETED")
            .ok_or(PayPalError::MissingCapture)?;

        Ok(CaptureResult {
            capture_id: record.id,
        })
    }
}

fn map_timeout(e: reqwest::Error) -> PayPalError {
    if e.is_timeout() {
        PayPalError::Timeout
    } else {
        PayPalError::Http(e)
    }
}
