//! Guest receipt access handlers.
//!
//! A receipt link is not enough on its own; the holder must also prove they
//! know the buyer's email address. A wrong token and a wrong email produce
//! the same generic 401 so neither input can be probed separately.

use axum::{Json, extract::State};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use pixelfair_core::Email;

use crate::db::{OrderRepository, orders::Order, users::SendGate};
use crate::error::{AppError, Result};
use crate::middleware::grant_receipt_access;
use crate::state::AppState;

/// Minimum gap between receipt re-sends for the same order.
const RESEND_COOLDOWN_SECONDS: i64 = 120;

#[derive(Debug, Deserialize)]
pub struct ReceiptChallengeBody {
    pub token: String,
    pub email: String,
}

/// Verify a receipt token against the buyer's email and grant access.
///
/// Success stores a 15-minute order-scoped grant in the session.
#[instrument(skip(state, session, body))]
pub async fn verify(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<ReceiptChallengeBody>,
) -> Result<Json<Value>> {
    let order = challenge(&state, &body).await?;

    let now = Utc::now();
    grant_receipt_access(&session, order.id, &order.receipt_token, now)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(Json(json!({ "success": true, "orderId": order.id })))
}

/// Re-send the receipt email, cooldown-gated per order.
#[instrument(skip(state, body))]
pub async fn resend(
    State(state): State<AppState>,
    Json(body): Json<ReceiptChallengeBody>,
) -> Result<Json<Value>> {
    let order = challenge(&state, &body).await?;

    let gate = OrderRepository::new(state.pool())
        .gate_receipt_resend(
            order.id,
            Duration::seconds(RESEND_COOLDOWN_SECONDS),
            Utc::now(),
        )
        .await?;

    if let SendGate::Cooldown { wait_seconds } = gate {
        return Err(AppError::RateLimited { wait_seconds });
    }

    state
        .email()
        .send_receipt_email(
            &order.buyer_email,
            &order.buyer_name,
            order.id.as_i32(),
            &order.receipt_token,
        )
        .await?;

    Ok(Json(json!({ "success": true })))
}

/// Resolve the token/email challenge to an order.
///
/// Every failure mode collapses into one generic 401.
async fn challenge(state: &AppState, body: &ReceiptChallengeBody) -> Result<Order> {
    let generic = || AppError::Unauthorized("invalid receipt credentials".to_string());

    let order = OrderRepository::new(state.pool())
        .get_by_receipt_token(body.token.trim())
        .await?
        .ok_or_else(generic)?;

    if order.receipt_expires_at < Utc::now() {
        return Err(generic());
    }

    if !Email::normalized_eq(&order.buyer_email, &body.email) {
        return Err(generic());
    }

    Ok(order)
}
