//! Admin grant management handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use pixelfair_core::{AdminUserId, Email};

use crate::db::{AdminRepository, admin::AdminUser};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddAdminBody {
    pub email: String,
}

/// List all admin grants.
#[instrument(skip(_admin, state))]
pub async fn list(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminUser>>> {
    let admins = AdminRepository::new(state.pool()).list().await?;
    Ok(Json(admins))
}

/// Grant admin to the user holding an email address.
#[instrument(skip(admin, state, body))]
pub async fn add(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<AddAdminBody>,
) -> Result<Json<AdminUser>> {
    let email = Email::parse(&body.email)
        .map_err(|e| AppError::Validation(format!("invalid email: {e}")))?;

    let admins = AdminRepository::new(state.pool());
    let grant = admins.add_by_email(&email, Some(admin.id)).await?;

    admins
        .audit(
            admin.id,
            "admin.add",
            "admin_user",
            grant.id.as_i32(),
            None,
            Some(&json!({ "userId": grant.user_id, "email": grant.email })),
        )
        .await?;

    Ok(Json(grant))
}

/// Revoke an admin grant. The last grant can never be removed.
#[instrument(skip(admin, state))]
pub async fn remove(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<AdminUserId>,
) -> Result<Json<Value>> {
    let admins = AdminRepository::new(state.pool());
    admins.remove(id).await?;

    admins
        .audit(
            admin.id,
            "admin.remove",
            "admin_user",
            id.as_i32(),
            None,
            None,
        )
        .await?;

    Ok(Json(json!({ "success": true })))
}
