//! Email verification handlers.

use axum::{
    Json,
    extract::{Query, State},
    response::Redirect,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::db::{
    UserRepository,
    users::{SendGate, VerificationOutcome},
};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::services::email::generate_token;
use crate::state::AppState;

/// Minimum gap between verification emails to the same user.
const SEND_COOLDOWN_SECONDS: i64 = 120;

/// How long a verification token stays valid.
const TOKEN_TTL_HOURS: i64 = 24;

/// Send a verification link to the logged-in user's email address.
///
/// Cooldown-gated: inside the window the response is 429 with the remaining
/// wait. The gate stamps the send time atomically, so the email goes out at
/// most once per window even under concurrent requests.
#[instrument(skip(user, state))]
pub async fn send_verification(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Value>> {
    let users = UserRepository::new(state.pool());
    let now = Utc::now();

    let gate = users
        .gate_verification_send(user.id, Duration::seconds(SEND_COOLDOWN_SECONDS), now)
        .await?;

    if let SendGate::Cooldown { wait_seconds } = gate {
        return Err(AppError::RateLimited { wait_seconds });
    }

    let token = generate_token();
    users
        .create_verification_token(user.id, &token, now + Duration::hours(TOKEN_TTL_HOURS))
        .await?;

    state
        .email()
        .send_verification_email(user.email.as_str(), &token)
        .await?;

    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    #[serde(default)]
    pub token: String,
}

/// Consume a verification token from an email link.
///
/// Browser-facing redirect flow: every outcome lands on the frontend's
/// verify-email page with either `success=true` or an `error` code
/// (`invalid_token`, `already_used`, `expired`).
#[instrument(skip(state, query))]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Redirect> {
    let base = state.config().base_url.trim_end_matches('/').to_string();

    if query.token.is_empty() {
        return Ok(Redirect::to(&format!(
            "{base}/verify-email?error=invalid_token"
        )));
    }

    let outcome = UserRepository::new(state.pool())
        .consume_verification_token(&query.token, Utc::now())
        .await?;

    let target = match outcome {
        VerificationOutcome::Verified(user_id) => {
            tracing::info!(user_id = %user_id, "Email verified");
            format!("{base}/verify-email?success=true")
        }
        VerificationOutcome::NotFound => format!("{base}/verify-email?error=invalid_token"),
        VerificationOutcome::AlreadyUsed => format!("{base}/verify-email?error=already_used"),
        VerificationOutcome::Expired => format!("{base}/verify-email?error=expired"),
    };

    Ok(Redirect::to(&target))
}
