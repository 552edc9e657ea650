//! Admin repository: capability grants and the audit trail.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use pixelfair_core::{AdminUserId, Email, UserId};

use super::{RepositoryError, conflict_on_unique};

/// An admin capability grant joined with the holder's identity.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: AdminUserId,
    pub user_id: UserId,
    pub email: Email,
    pub granted_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Repository for admin grants and audit logging.
pub struct AdminRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRepository<'a> {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Check whether a user holds the admin capability.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_admin(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM admin_users WHERE user_id = $1)")
                .bind(user_id)
                .fetch_one(self.pool)
                .await?;

        Ok(exists)
    }

    /// List all admin grants, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminUser>(
            r"
            SELECT a.id, a.user_id, u.email, a.granted_by, a.created_at
            FROM admin_users a
            JOIN users u ON u.id = a.user_id
            ORDER BY a.created_at
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Grant admin to the user holding an email address.
    ///
    /// Lookup is case-insensitive. This path may see unverified accounts; it
    /// is only reachable by existing admins and the CLI.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has that email, or
    /// `RepositoryError::Conflict` if the user is already an admin.
    pub async fn add_by_email(
        &self,
        email: &Email,
        granted_by: Option<UserId>,
    ) -> Result<AdminUser, RepositoryError> {
        let user_id: Option<UserId> =
            sqlx::query_scalar("SELECT id FROM users WHERE lower(email) = lower($1)")
                .bind(email.as_str())
                .fetch_optional(self.pool)
                .await?;

        let user_id = user_id.ok_or(RepositoryError::NotFound)?;

        let row = sqlx::query_as::<_, AdminUser>(
            r"
            WITH grant_row AS (
                INSERT INTO admin_users (user_id, granted_by)
                VALUES ($1, $2)
                RETURNING id, user_id, granted_by, created_at
            )
            SELECT g.id, g.user_id, u.email, g.granted_by, g.created_at
            FROM grant_row g
            JOIN users u ON u.id = g.user_id
            ",
        )
        .bind(user_id)
        .bind(granted_by)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "user is already an admin"))?;

        Ok(row)
    }

    /// Revoke an admin grant.
    ///
    /// Invariant: the last grant can never be removed. The count runs with
    /// the table's grant rows locked so two concurrent removals cannot both
    /// observe two admins and empty the table.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the grant doesn't exist, or
    /// `RepositoryError::Conflict` if it is the last one.
    pub async fn remove(&self, id: AdminUserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let ids: Vec<AdminUserId> =
            sqlx::query_scalar("SELECT id FROM admin_users ORDER BY id FOR UPDATE")
                .fetch_all(&mut *tx)
                .await?;

        if !ids.contains(&id) {
            return Err(RepositoryError::NotFound);
        }

        if ids.len() == 1 {
            return Err(RepositoryError::Conflict(
                "cannot remove the last admin".to_owned(),
            ));
        }

        sqlx::query("DELETE FROM admin_users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Append an audit record for a privileged mutation.
    ///
    /// `before` and `after` are JSON snapshots of the touched entity. The
    /// table is append-only; there are no update or delete paths.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn audit(
        &self,
        admin_id: UserId,
        action: &str,
        entity_type: &str,
        entity_id: i32,
        before: Option<&serde_json::Value>,
        after: Option<&serde_json::Value>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO admin_audit_logs (admin_id, action, entity_type, entity_id, before, after)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(admin_id)
        .bind(action)
        .bind(entity_type)
        .bind(entity_id)
        .bind(before)
        .bind(after)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
