//! Admin seller moderation handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use pixelfair_core::{SellerId, SellerStatus};

use crate::db::{
    AdminRepository, SellerRepository,
    sellers::{Seller, SuspendOutcome},
};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SuspendBody {
    pub suspend: bool,
    pub reason: String,
}

/// Move a seller to a new status (`active` / `payouts_locked`).
///
/// Suspension goes through the suspend endpoint; the plain update rejects it.
#[instrument(skip(admin, state))]
pub async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<SellerId>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<Seller>> {
    let status: SellerStatus = body
        .status
        .parse()
        .map_err(|_| AppError::Validation(format!("invalid seller status: {}", body.status)))?;

    if status == SellerStatus::Suspended {
        return Err(AppError::Validation(
            "use the suspend endpoint to suspend a seller".to_string(),
        ));
    }

    let sellers = SellerRepository::new(state.pool());
    let before = sellers
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("seller not found".to_string()))?;

    let after = sellers.update_status(id, status).await?;

    AdminRepository::new(state.pool())
        .audit(
            admin.id,
            "seller.update_status",
            "seller",
            id.as_i32(),
            Some(&json!({ "status": before.status })),
            Some(&json!({ "status": after.status })),
        )
        .await?;

    Ok(Json(after))
}

/// Suspend or reinstate a seller.
///
/// Delegates to the backend procedure, which applies the status change and
/// records the acting admin and reason atomically.
#[instrument(skip(admin, state))]
pub async fn suspend(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<SellerId>,
    Json(body): Json<SuspendBody>,
) -> Result<Json<Value>> {
    let reason = body.reason.trim();
    if reason.is_empty() {
        return Err(AppError::Validation("a reason is required".to_string()));
    }

    let outcome = SellerRepository::new(state.pool())
        .suspend(id, admin.id, body.suspend, reason)
        .await?;

    match outcome {
        SuspendOutcome::Applied { is_suspended } => {
            tracing::info!(seller_id = %id, is_suspended, "Seller suspension updated");
            Ok(Json(json!({ "success": true, "is_suspended": is_suspended })))
        }
        SuspendOutcome::NotFound => Err(AppError::NotFound("seller not found".to_string())),
    }
}
