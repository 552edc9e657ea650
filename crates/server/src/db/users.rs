//! User repository: identity lookups and email verification tokens.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

use pixelfair_core::{Email, UserId, VerificationTokenId};

use super::RepositoryError;

/// A marketplace user account.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub email_verified: bool,
    #[serde(skip)]
    pub last_verification_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of consuming an email verification token.
///
/// The four checks are strictly ordered and short-circuit: missing token,
/// already used, expired, then success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified(UserId),
    NotFound,
    AlreadyUsed,
    Expired,
}

/// Gate result for cooldown-limited sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendGate {
    Allowed,
    Cooldown { wait_seconds: i64 },
}

#[derive(Debug, sqlx::FromRow)]
struct TokenRow {
    id: VerificationTokenId,
    user_id: UserId,
    used_at: Option<DateTime<Utc>>,
    expires_at: DateTime<Utc>,
}

/// Repository for user accounts and verification tokens.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, User>(
            r"
            SELECT id, email, email_verified, last_verification_sent_at, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, User>(
            r"
            SELECT id, email, email_verified, last_verification_sent_at, created_at
            FROM users
            WHERE lower(email) = lower($1)
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Gate a verification send on the per-user cooldown.
    ///
    /// Atomically stamps `last_verification_sent_at` when the cooldown has
    /// elapsed; otherwise reports the remaining wait. The stamp and the check
    /// are one `UPDATE` so two concurrent sends cannot both pass the gate.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn gate_verification_send(
        &self,
        user_id: UserId,
        cooldown: Duration,
        now: DateTime<Utc>,
    ) -> Result<SendGate, RepositoryError> {
        let threshold = now - cooldown;

        let result = sqlx::query(
            r"
            UPDATE users
            SET last_verification_sent_at = $2
            WHERE id = $1
              AND (last_verification_sent_at IS NULL OR last_verification_sent_at <= $3)
            ",
        )
        .bind(user_id)
        .bind(now)
        .bind(threshold)
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(SendGate::Allowed);
        }

        let user = self.get(user_id).await?.ok_or(RepositoryError::NotFound)?;
        let wait_seconds = user
            .last_verification_sent_at
            .map_or(0, |sent| (sent + cooldown - now).num_seconds().max(0));

        Ok(SendGate::Cooldown { wait_seconds })
    }

    /// Store a freshly issued verification token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_verification_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO email_verification_tokens (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Consume a verification token.
    ///
    /// Single mutation path with strictly ordered, short-circuiting checks:
    /// reject if missing, reject if `used_at` is already set, reject if
    /// `expires_at` has passed, otherwise mark used and flip the user's
    /// verified flag. Marking and flipping happen in one transaction with the
    /// token row locked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn consume_verification_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<VerificationOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, TokenRow>(
            r"
            SELECT id, user_id, used_at, expires_at
            FROM email_verification_tokens
            WHERE token = $1
            FOR UPDATE
            ",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(VerificationOutcome::NotFound);
        };

        if row.used_at.is_some() {
            return Ok(VerificationOutcome::AlreadyUsed);
        }

        if row.expires_at < now {
            return Ok(VerificationOutcome::Expired);
        }

        sqlx::query("UPDATE email_verification_tokens SET used_at = $2 WHERE id = $1")
            .bind(row.id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE users SET email_verified = TRUE WHERE id = $1")
            .bind(row.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(VerificationOutcome::Verified(row.user_id))
    }
}
