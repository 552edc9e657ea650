//! Scheduled-job endpoints.
//!
//! Invoked by an external scheduler with a bearer shared secret, not by
//! browsers. Each job is idempotent so a retried invocation is harmless.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
};
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tracing::instrument;

use crate::db::PayoutRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Release matured escrow entries to seller balances.
///
/// Auth is an exact bearer-token match against the configured cron secret.
#[instrument(skip(state, headers))]
pub async fn release_escrow(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == state.config().cron_secret.expose_secret());

    if !authorized {
        return Err(AppError::Unauthorized("invalid cron secret".to_string()));
    }

    let result = PayoutRepository::new(state.pool())
        .release_matured_escrow()
        .await?;

    tracing::info!(
        records_processed = result.records_processed,
        total_amount_released = %result.total_amount_released,
        "Escrow release sweep finished"
    );

    Ok(Json(json!({
        "success": true,
        "records_processed": result.records_processed,
        "total_amount_released": result.total_amount_released,
    })))
}
