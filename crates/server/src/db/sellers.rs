//! Seller repository: account lookups, status updates, suspension.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use pixelfair_core::{SellerId, SellerStatus, UserId};

use super::RepositoryError;

/// A seller account linked to a user identity.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Seller {
    pub id: SellerId,
    pub user_id: UserId,
    pub display_name: String,
    pub status: SellerStatus,
    pub available_balance: Decimal,
    pub payout_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Tagged result of the `suspend_seller` backend procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspendOutcome {
    /// Suspension flag applied; carries the resulting suspension state.
    Applied { is_suspended: bool },
    /// No seller with that id.
    NotFound,
}

/// Repository for seller accounts.
pub struct SellerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SellerRepository<'a> {
    /// Create a new seller repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a seller by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: SellerId) -> Result<Option<Seller>, RepositoryError> {
        let row = sqlx::query_as::<_, Seller>(
            r"
            SELECT id, user_id, display_name, status, available_balance, payout_email, created_at
            FROM sellers
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Get the seller account owned by a user, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Option<Seller>, RepositoryError> {
        let row = sqlx::query_as::<_, Seller>(
            r"
            SELECT id, user_id, display_name, status, available_balance, payout_email, created_at
            FROM sellers
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Apply a plain status update (`active` / `payouts_locked`).
    ///
    /// Suspension must go through [`Self::suspend`] instead; the backend
    /// procedure carries its own audit semantics.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the seller doesn't exist.
    pub async fn update_status(
        &self,
        id: SellerId,
        status: SellerStatus,
    ) -> Result<Seller, RepositoryError> {
        let row = sqlx::query_as::<_, Seller>(
            r"
            UPDATE sellers
            SET status = $2
            WHERE id = $1
            RETURNING id, user_id, display_name, status, available_balance, payout_email, created_at
            ",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Suspend or unsuspend a seller via the `suspend_seller` procedure.
    ///
    /// The procedure records the acting admin and reason itself and is atomic
    /// with the status change. The raw text result is decoded into a tagged
    /// [`SuspendOutcome`] at this boundary.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the call fails, or
    /// `RepositoryError::DataCorruption` if the procedure returns an
    /// unrecognized tag.
    pub async fn suspend(
        &self,
        id: SellerId,
        admin_id: UserId,
        suspend: bool,
        reason: &str,
    ) -> Result<SuspendOutcome, RepositoryError> {
        let outcome: String = sqlx::query_scalar("SELECT suspend_seller($1, $2, $3, $4)")
            .bind(id)
            .bind(admin_id)
            .bind(suspend)
            .bind(reason)
            .fetch_one(self.pool)
            .await?;

        match outcome.as_str() {
            "suspended" => Ok(SuspendOutcome::Applied { is_suspended: true }),
            "reinstated" => Ok(SuspendOutcome::Applied {
                is_suspended: false,
            }),
            "not_found" => Ok(SuspendOutcome::NotFound),
            other => Err(RepositoryError::DataCorruption(format!(
                "suspend_seller returned unknown tag: {other}"
            ))),
        }
    }

    /// Set the seller's payout destination email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the seller doesn't exist.
    pub async fn set_payout_email(
        &self,
        id: SellerId,
        payout_email: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE sellers SET payout_email = $2 WHERE id = $1")
            .bind(id)
            .bind(payout_email)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
