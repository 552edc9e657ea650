//! Buyer account dashboard handlers.

use std::sync::Arc;

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::{OrderRepository, orders::OrderSummary};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::state::AppState;

/// List the caller's order summaries, newest first.
///
/// Served through the in-memory cache; order capture invalidates the entry
/// so a fresh purchase shows up immediately.
#[instrument(skip(user, state))]
pub async fn orders(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderSummary>>> {
    let pool = state.pool().clone();
    let user_id = user.id;

    let summaries = state
        .order_cache()
        .try_get_with(user_id, async move {
            OrderRepository::new(&pool)
                .summaries_for_user(user_id)
                .await
                .map(Arc::new)
        })
        .await
        .map_err(|e: Arc<crate::db::RepositoryError>| {
            crate::error::AppError::Internal(format!("order summary lookup failed: {e}"))
        })?;

    Ok(Json(summaries.as_ref().clone()))
}
