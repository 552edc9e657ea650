//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /ready                           - Readiness check (database ping)
//!
//! # Orders
//! POST /api/orders/capture              - Capture a PayPal order
//! GET  /api/downloads/{order}/{item}    - Signed download redirect
//!
//! # Payouts (seller session)
//! POST /api/payouts/request             - Request a payout
//! GET  /api/payouts                     - List own payout requests
//!
//! # Products (seller session)
//! GET  /api/products                    - List own products
//! POST /api/products                    - Create draft
//! POST /api/products/{id}/publish       - Publish
//! POST /api/products/{id}/archive       - Archive
//! DELETE /api/products/{id}             - Delete (archives when ordered)
//!
//! # Email verification
//! POST /api/auth/send-verification      - Send verification link
//! GET  /api/auth/verify-email           - Consume token (redirect flow)
//!
//! # Guest receipts
//! POST /api/receipt/verify              - Token + email challenge
//! POST /api/receipt/resend              - Re-send receipt email
//!
//! # Account
//! GET  /api/account/orders              - Buyer order summaries (cached)
//!
//! # Admin (see routes/admin)
//! /api/admin/...
//!
//! # Cron
//! GET  /api/cron/release-escrow         - Release matured escrow
//! ```

pub mod account;
pub mod admin;
pub mod cron;
pub mod orders;
pub mod payouts;
pub mod products;
pub mod receipts;
pub mod verification;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
};
use serde_json::{Value, json};

use crate::state::AppState;

/// Build the complete application router.
pub fn router() -> Router<AppState> {
    let api = Router::new()
        .route("/orders/capture", post(orders::capture))
        .route("/downloads/{order_id}/{item_id}", get(orders::download))
        .route("/payouts/request", post(payouts::request_payout))
        .route("/payouts", get(payouts::list_payouts))
        .route("/products", get(products::list).post(products::create))
        .route("/products/{id}/publish", post(products::publish))
        .route("/products/{id}/archive", post(products::archive))
        .route("/products/{id}", delete(products::delete))
        .route("/auth/send-verification", post(verification::send_verification))
        .route("/auth/verify-email", get(verification::verify_email))
        .route("/receipt/verify", post(receipts::verify))
        .route("/receipt/resend", post(receipts::resend))
        .route("/account/orders", get(account::orders))
        .route("/cron/release-escrow", get(cron::release_escrow))
        .nest("/admin", admin::router());

    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .nest("/api", api)
}

/// Liveness check.
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness check: verifies the database answers.
async fn ready(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(state.pool())
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    Ok(Json(json!({ "status": "ready" })))
}
