//! Admin payout moderation handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use pixelfair_core::{PayoutRequestId, PayoutStatus};

use crate::db::{AdminRepository, PayoutRepository, payouts::FailOutcome};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct FailBody {
    pub reason: String,
}

/// Move a payout request to a new status.
///
/// `failed` is rejected here; the fail endpoint owns the refund credit.
#[instrument(skip(admin, state))]
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<PayoutRequestId>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<Value>> {
    let status: PayoutStatus = body
        .status
        .parse()
        .map_err(|_| AppError::Validation(format!("invalid payout status: {}", body.status)))?;

    if status == PayoutStatus::Failed {
        return Err(AppError::Validation(
            "use the fail endpoint to fail a payout".to_string(),
        ));
    }

    let payouts = PayoutRepository::new(state.pool());
    let before = payouts
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("payout request not found".to_string()))?;

    let after = payouts.update_status(id, status).await?;

    AdminRepository::new(state.pool())
        .audit(
            admin.id,
            "payout.update_status",
            "payout_request",
            id.as_i32(),
            Some(&json!({ "status": before.status })),
            Some(&json!({ "status": after.status })),
        )
        .await?;

    Ok(Json(json!({
        "message": format!("payout moved to {status}"),
        "payout": after,
    })))
}

/// Fail a payout request, refunding the amount to the seller.
#[instrument(skip(admin, state))]
pub async fn fail(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<PayoutRequestId>,
    Json(body): Json<FailBody>,
) -> Result<Json<Value>> {
    let reason = body.reason.trim();
    if reason.is_empty() {
        return Err(AppError::Validation(
            "a failure reason is required".to_string(),
        ));
    }

    let payouts = PayoutRepository::new(state.pool());
    let before = payouts
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("payout request not found".to_string()))?;

    let outcome = payouts.fail(id, reason).await?;

    match outcome {
        FailOutcome::Refunded => {}
        FailOutcome::NotFound => {
            return Err(AppError::NotFound("payout request not found".to_string()));
        }
        FailOutcome::InvalidState => {
            return Err(AppError::Conflict(format!(
                "payout in status {} cannot be failed",
                before.status
            )));
        }
    }

    let after = payouts
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("payout request not found".to_string()))?;

    AdminRepository::new(state.pool())
        .audit(
            admin.id,
            "payout.fail",
            "payout_request",
            id.as_i32(),
            Some(&json!({ "status": before.status })),
            Some(&json!({ "status": after.status, "reason": reason })),
        )
        .await?;

    Ok(Json(json!({
        "message": "payout failed and amount refunded to seller balance",
    })))
}
