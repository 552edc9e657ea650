//! Database operations for the marketplace `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users` - Buyer/seller identity accounts
//! - `sellers` - Seller accounts (status, available balance, payout email)
//! - `products` - Digital-goods listings with dual B2C/B2B pricing
//! - `orders` / `order_items` - Captured purchases and their line items
//! - `payout_requests` - Seller withdrawal requests
//! - `admin_users` - Admin capability grants
//! - `admin_audit_logs` - Append-only audit trail of privileged mutations
//! - `email_verification_tokens` - One-time email confirmation tokens
//! - `escrow_entries` / `escrow_release_ledger` - Matured-escrow bookkeeping
//!
//! ## Stored procedures
//!
//! The transactional core (`request_payout`, `fail_payout`, `suspend_seller`,
//! `release_matured_escrow`, `fulfill_order_from_webhook`) lives in the
//! database; this layer marshals arguments, decodes the tagged results, and
//! never re-implements the balance arithmetic.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p pixelfair-cli -- migrate
//! ```

pub mod admin;
pub mod orders;
pub mod payouts;
pub mod products;
pub mod sellers;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin::AdminRepository;
pub use orders::OrderRepository;
pub use payouts::PayoutRepository;
pub use products::ProductRepository;
pub use sellers::SellerRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate admin grant).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation onto [`RepositoryError::Conflict`].
fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}
