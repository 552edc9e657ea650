//! Authentication extractors.
//!
//! Three privilege tiers, checked in order: an authenticated user (session),
//! a seller (user owning a seller account), and an admin (user with an
//! `admin_users` grant). Missing identity is 401; present identity without
//! the required privilege is 403.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use tower_sessions::Session;

use crate::db::{AdminRepository, SellerRepository, sellers::Seller};
use crate::error::AppError;
use crate::models::{CurrentUser, ReceiptGrant, session_keys};
use crate::state::AppState;

use pixelfair_core::OrderId;

use super::session::receipt_grant_ttl;

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireUser(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Never rejects; anonymous requests yield `None`.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// Extractor that requires the caller to own a seller account.
///
/// Carries the authenticated user and the full seller row so handlers can
/// check status and balance without a second lookup.
pub struct RequireSeller {
    pub user: CurrentUser,
    pub seller: Seller,
}

impl FromRequestParts<AppState> for RequireSeller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))?;

        let seller = SellerRepository::new(state.pool())
            .get_by_user(user.id)
            .await?
            .ok_or_else(|| AppError::Forbidden("seller account required".to_string()))?;

        Ok(Self { user, seller })
    }
}

/// Extractor that requires the caller to hold the admin capability.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))?;

        let is_admin = AdminRepository::new(state.pool()).is_admin(user.id).await?;
        if !is_admin {
            return Err(AppError::Forbidden("admin access required".to_string()));
        }

        Ok(Self(user))
    }
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Helper to set the current user in the session (login).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

/// Record a passed receipt email challenge in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn grant_receipt_access(
    session: &Session,
    order_id: OrderId,
    token: &str,
    now: DateTime<Utc>,
) -> Result<(), tower_sessions::session::Error> {
    let grant = ReceiptGrant {
        order_id,
        token: token.to_string(),
        expires_at: now + receipt_grant_ttl(),
    };
    session.insert(session_keys::RECEIPT_GRANT, &grant).await
}

/// Read the session's receipt grant if it still covers the given order.
pub async fn receipt_access(
    session: &Session,
    order_id: OrderId,
    now: DateTime<Utc>,
) -> Option<ReceiptGrant> {
    let grant = session
        .get::<ReceiptGrant>(session_keys::RECEIPT_GRANT)
        .await
        .ok()
        .flatten()?;

    grant.is_valid_for(order_id, now).then_some(grant)
}
