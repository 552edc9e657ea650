//! Admin order intervention handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::instrument;

use pixelfair_core::OrderId;

use crate::db::{AdminRepository, OrderRepository, orders::FulfillOutcome};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Manually fulfill an order stuck in `pending`.
///
/// For cases where the payment went through but the capture confirmation
/// never landed. Uses a synthesized `MANUAL-<timestamp>` capture id and is
/// audit-logged like every other admin mutation.
#[instrument(skip(admin, state))]
pub async fn fulfill(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Value>> {
    let orders = OrderRepository::new(state.pool());
    let before = orders
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".to_string()))?;

    let capture_id = format!("MANUAL-{}", Utc::now().timestamp());
    let outcome = orders.fulfill(id, &capture_id).await?;

    match outcome {
        FulfillOutcome::Fulfilled => {}
        FulfillOutcome::NotFound => {
            return Err(AppError::NotFound("order not found".to_string()));
        }
        FulfillOutcome::AlreadyCompleted => {
            return Err(AppError::Conflict("order is already completed".to_string()));
        }
    }

    AdminRepository::new(state.pool())
        .audit(
            admin.id,
            "order.manual_fulfill",
            "order",
            id.as_i32(),
            Some(&json!({ "paymentStatus": before.payment_status })),
            Some(&json!({ "paymentStatus": "completed", "captureId": capture_id })),
        )
        .await?;

    if let Some(user_id) = before.user_id {
        state.order_cache().invalidate(&user_id).await;
    }

    tracing::info!(order_id = %id, capture_id = %capture_id, "Order fulfilled manually");

    Ok(Json(json!({ "success": true, "captureId": capture_id })))
}
