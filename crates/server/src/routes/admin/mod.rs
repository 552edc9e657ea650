//! Admin moderation endpoints.
//!
//! Every mutation follows one fixed pattern: authenticate, authorize against
//! `admin_users`, validate the transition, snapshot the entity, mutate, and
//! append an audit row. Handlers that delegate to self-auditing backend
//! procedures skip the explicit audit step.

pub mod orders;
pub mod payouts;
pub mod sellers;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::state::AppState;

/// Build the admin sub-router, mounted under `/api/admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payouts/{id}/status", patch(payouts::update_status))
        .route("/payouts/{id}/fail", post(payouts::fail))
        .route("/sellers/{id}/status", patch(sellers::update_status))
        .route("/sellers/{id}/suspend", post(sellers::suspend))
        .route("/users", get(users::list).post(users::add))
        .route("/users/{id}", delete(users::remove))
        .route("/orders/{id}/fulfill", post(orders::fulfill))
}
