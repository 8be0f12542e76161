use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            ForgotPasswordRequest, LoginRequest, MessageResponse, PublicUser, RegisterRequest,
            ResetPasswordRequest,
        },
        password::{hash_password, verify_password},
        repo::User,
        token::ResetTokenKeys,
    },
    error::{is_unique_violation, ApiError},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_password_strength(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::Validation("Password too short".into()));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.account = payload.account.trim().to_string();

    if payload.account.is_empty() {
        return Err(ApiError::Validation("Account is required".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    check_password_strength(&payload.password)?;

    if User::find_by_account(&state.db, &payload.account)
        .await?
        .is_some()
    {
        warn!(account = %payload.account, "account already registered");
        return Err(ApiError::DuplicateAccount);
    }

    let hash = hash_password(&payload.password)?;

    let user = match User::create(&state.db, &payload.account, &payload.email, &hash).await {
        Ok(u) => u,
        // Concurrent registration can lose the race at the constraint.
        Err(e) if is_unique_violation(&e) => {
            warn!(account = %payload.account, "duplicate account at insert");
            return Err(ApiError::DuplicateAccount);
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = user.id, account = %user.account, "user registered");
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let login = payload.login.trim();

    // Same error for unknown login and wrong password.
    let user = User::find_by_login(&state.db, login)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = user.id, "login with invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    info!(user_id = user.id, account = %user.account, "user logged in");
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(mut payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let keys = ResetTokenKeys::from_ref(&state);
    let token = keys.issue(user.id)?;
    let reset_link = format!(
        "{}/reset-password?token={}",
        state.config.base_url, token
    );

    state
        .mailer
        .send_reset_email(&user.email, &reset_link)
        .await?;

    info!(user_id = user.id, "password reset email sent");
    Ok(Json(MessageResponse {
        message: "Password reset email sent",
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let keys = ResetTokenKeys::from_ref(&state);
    let user_id = keys.verify(&payload.token)?;

    // A consumed token stops working even while its exp is still ahead.
    if state.used_tokens.is_used(&payload.token) {
        warn!(user_id, "reset token reuse");
        return Err(ApiError::InvalidToken);
    }

    check_password_strength(&payload.new_password)?;

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let hash = hash_password(&payload.new_password)?;
    User::update_password(&state.db, user.id, &hash).await?;
    state.used_tokens.mark_used(&payload.token, keys.ttl);

    info!(user_id = user.id, "password updated");
    Ok(Json(MessageResponse {
        message: "Password updated",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_validation() {
        assert!(is_valid_email("alice@x.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("alice@x"));
        assert!(!is_valid_email("al ice@x.com"));
    }

    #[test]
    fn password_strength_floor() {
        assert!(check_password_strength("1234567").is_err());
        assert!(check_password_strength("12345678").is_ok());
    }
}
