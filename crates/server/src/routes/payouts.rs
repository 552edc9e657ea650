//! Seller payout handlers.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use pixelfair_core::SellerStatus;

use crate::db::{
    PayoutRepository,
    payouts::{PayoutRequest, RequestOutcome},
};
use crate::error::{AppError, Result};
use crate::middleware::RequireSeller;
use crate::state::AppState;

/// Smallest payout a seller can request.
pub const MINIMUM_PAYOUT: Decimal = Decimal::from_parts(1000, 0, 0, false, 2);

#[derive(Debug, Deserialize)]
pub struct PayoutRequestBody {
    pub amount: Decimal,
}

/// Request a payout of the seller's available balance.
///
/// Cheap pre-checks run here for friendly errors; the balance debit itself is
/// atomic in the backend procedure, which re-checks everything under a row
/// lock. A request passing the pre-checks can still lose the race and come
/// back `insufficient_balance`.
#[instrument(skip(seller, state))]
pub async fn request_payout(
    seller: RequireSeller,
    State(state): State<AppState>,
    Json(body): Json<PayoutRequestBody>,
) -> Result<Json<Value>> {
    if body.amount < MINIMUM_PAYOUT {
        return Err(AppError::Validation(format!(
            "minimum payout is {MINIMUM_PAYOUT}"
        )));
    }
    if seller.seller.payout_email.is_none() {
        return Err(AppError::Validation(
            "no payout email configured".to_string(),
        ));
    }
    if seller.seller.status != SellerStatus::Active {
        return Err(AppError::Forbidden(
            "seller account is not active".to_string(),
        ));
    }
    if body.amount > seller.seller.available_balance {
        return Err(AppError::Validation("insufficient balance".to_string()));
    }

    let outcome = PayoutRepository::new(state.pool())
        .request(seller.seller.id, body.amount)
        .await?;

    match outcome {
        RequestOutcome::Created(id) => {
            tracing::info!(payout_id = %id, amount = %body.amount, "Payout requested");
            Ok(Json(json!({ "success": true, "requestId": id })))
        }
        RequestOutcome::InsufficientBalance => {
            Err(AppError::Validation("insufficient balance".to_string()))
        }
        RequestOutcome::NoPayoutEmail => Err(AppError::Validation(
            "no payout email configured".to_string(),
        )),
        RequestOutcome::SellerNotActive => Err(AppError::Forbidden(
            "seller account is not active".to_string(),
        )),
    }
}

/// List the caller's payout requests.
#[instrument(skip(seller, state))]
pub async fn list_payouts(
    seller: RequireSeller,
    State(state): State<AppState>,
) -> Result<Json<Vec<PayoutRequest>>> {
    let payouts = PayoutRepository::new(state.pool())
        .list_for_seller(seller.seller.id)
        .await?;

    Ok(Json(payouts))
}
