//! Payout repository: seller withdrawals and escrow release.
//!
//! The money-moving paths (`request_payout`, `fail_payout`,
//! `release_matured_escrow`) are backend procedures; their atomic balance
//! arithmetic is never duplicated here. This layer decodes the procedures'
//! text tags into Rust enums and surfaces unknown tags as corruption.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use pixelfair_core::{PayoutRequestId, PayoutStatus, SellerId};

use super::RepositoryError;

/// A seller payout request.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRequest {
    pub id: PayoutRequestId,
    pub seller_id: SellerId,
    pub amount: Decimal,
    pub payout_email: String,
    pub status: PayoutStatus,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tagged result of the `request_payout` backend procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Balance debited and a pending request created.
    Created(PayoutRequestId),
    /// Requested amount exceeds the available balance.
    InsufficientBalance,
    /// Seller has not configured a payout destination.
    NoPayoutEmail,
    /// Seller is suspended or payout-locked.
    SellerNotActive,
}

/// Tagged result of the `fail_payout` backend procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOutcome {
    /// Marked failed and the amount credited back to the seller.
    Refunded,
    /// No payout request with that id.
    NotFound,
    /// Request is not in a failable state (already completed or failed).
    InvalidState,
}

/// Aggregate result of one escrow release sweep.
///
/// Serialized snake_case; the cron caller reads `records_processed` and
/// `total_amount_released` as spelled here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct EscrowReleaseResult {
    pub records_processed: i64,
    pub total_amount_released: Decimal,
}

/// Repository for payout requests and escrow release.
pub struct PayoutRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PayoutRepository<'a> {
    /// Create a new payout repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Request a payout through the `request_payout` procedure.
    ///
    /// The procedure locks the seller row, re-checks status, destination, and
    /// balance, debits the balance, and inserts the pending request in one
    /// transaction. A concurrent request can therefore never overdraw.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the call fails, or
    /// `RepositoryError::DataCorruption` if the procedure returns an
    /// unrecognized tag.
    pub async fn request(
        &self,
        seller_id: SellerId,
        amount: Decimal,
    ) -> Result<RequestOutcome, RepositoryError> {
        let outcome: String = sqlx::query_scalar("SELECT request_payout($1, $2)")
            .bind(seller_id)
            .bind(amount)
            .fetch_one(self.pool)
            .await?;

        // Success tag is "ok:<id>".
        if let Some(raw_id) = outcome.strip_prefix("ok:") {
            let id = raw_id.parse::<i32>().map_err(|_| {
                RepositoryError::DataCorruption(format!(
                    "request_payout returned malformed id: {raw_id}"
                ))
            })?;
            return Ok(RequestOutcome::Created(PayoutRequestId::new(id)));
        }

        match outcome.as_str() {
            "insufficient_balance" => Ok(RequestOutcome::InsufficientBalance),
            "no_payout_email" => Ok(RequestOutcome::NoPayoutEmail),
            "seller_not_active" => Ok(RequestOutcome::SellerNotActive),
            other => Err(RepositoryError::DataCorruption(format!(
                "request_payout returned unknown tag: {other}"
            ))),
        }
    }

    /// Get a payout request by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PayoutRequestId) -> Result<Option<PayoutRequest>, RepositoryError> {
        let row = sqlx::query_as::<_, PayoutRequest>(
            r"
            SELECT id, seller_id, amount, payout_email, status, failure_reason,
                   created_at, updated_at
            FROM payout_requests
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// List a seller's payout requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_seller(
        &self,
        seller_id: SellerId,
    ) -> Result<Vec<PayoutRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, PayoutRequest>(
            r"
            SELECT id, seller_id, amount, payout_email, status, failure_reason,
                   created_at, updated_at
            FROM payout_requests
            WHERE seller_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(seller_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// List all payout requests in a status, oldest first, for admin review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_status(
        &self,
        status: PayoutStatus,
    ) -> Result<Vec<PayoutRequest>, RepositoryError> {
        let rows = sqlx::query_as::<_, PayoutRequest>(
            r"
            SELECT id, seller_id, amount, payout_email, status, failure_reason,
                   created_at, updated_at
            FROM payout_requests
            WHERE status = $1
            ORDER BY created_at
            ",
        )
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Apply a forward status transition (`processing`, `completed`, `held`).
    ///
    /// Failing a payout must go through [`Self::fail`] instead; the refund
    /// credit lives in the procedure.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the request doesn't exist.
    pub async fn update_status(
        &self,
        id: PayoutRequestId,
        status: PayoutStatus,
    ) -> Result<PayoutRequest, RepositoryError> {
        let row = sqlx::query_as::<_, PayoutRequest>(
            r"
            UPDATE payout_requests
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, seller_id, amount, payout_email, status, failure_reason,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Fail a payout through the `fail_payout` procedure.
    ///
    /// The procedure marks the request failed, records the reason, and
    /// credits the amount back to the seller's balance atomically. Money is
    /// conserved: debit at request time plus this credit nets to zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the call fails, or
    /// `RepositoryError::DataCorruption` if the procedure returns an
    /// unrecognized tag.
    pub async fn fail(
        &self,
        id: PayoutRequestId,
        reason: &str,
    ) -> Result<FailOutcome, RepositoryError> {
        let outcome: String = sqlx::query_scalar("SELECT fail_payout($1, $2)")
            .bind(id)
            .bind(reason)
            .fetch_one(self.pool)
            .await?;

        match outcome.as_str() {
            "ok" => Ok(FailOutcome::Refunded),
            "not_found" => Ok(FailOutcome::NotFound),
            "invalid_state" => Ok(FailOutcome::InvalidState),
            other => Err(RepositoryError::DataCorruption(format!(
                "fail_payout returned unknown tag: {other}"
            ))),
        }
    }

    /// Release all matured escrow entries to seller balances.
    ///
    /// The `release_matured_escrow` procedure credits each matured entry
    /// exactly once (released entries are recorded in the release ledger), so
    /// repeated sweeps over the same window are idempotent and report zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the call fails.
    pub async fn release_matured_escrow(&self) -> Result<EscrowReleaseResult, RepositoryError> {
        let result = sqlx::query_as::<_, EscrowReleaseResult>(
            "SELECT records_processed, total_amount_released FROM release_matured_escrow()",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_escrow_release_result_serializes_snake_case() {
        let result = EscrowReleaseResult {
            records_processed: 3,
            total_amount_released: Decimal::new(4200, 2),
        };

        let value = serde_json::to_value(result).unwrap();
        assert_eq!(value["records_processed"], serde_json::json!(3));
        assert_eq!(value["total_amount_released"], serde_json::json!("42.00"));
    }
}
