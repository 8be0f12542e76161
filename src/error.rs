use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::mail::MailError;

/// Every client-facing failure the API can produce. Handlers return
/// `Result<_, ApiError>` so each case is mapped to a status exactly once.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Account already exists")]
    DuplicateAccount,
    #[error("Invalid account or password")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("Product not found")]
    ProductNotFound,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    ExpiredToken,
    #[error("{0}")]
    Validation(String),
    #[error("Failed to send email")]
    Transport(#[from] MailError),
    #[error("Database error")]
    Database(#[from] sqlx::Error),
    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::DuplicateAccount => StatusCode::CONFLICT,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::UserNotFound | ApiError::ProductNotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidToken | ApiError::ExpiredToken | ApiError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Transport(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Infrastructure details stay out of the response body.
            ApiError::Database(e) => {
                error!(error = %e, "database error");
                "Internal error".to_string()
            }
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "Internal error".to_string()
            }
            ApiError::Transport(e) => {
                error!(error = %e, "mail transport error");
                self.to_string()
            }
            other => {
                warn!(%status, error = %other, "request rejected");
                other.to_string()
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Unique-constraint violations are how concurrent duplicate registrations
/// lose the race; callers map them to `DuplicateAccount`.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(ApiError::DuplicateAccount.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::ProductNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::ExpiredToken.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Validation("price must be non-negative".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn login_errors_share_one_shape() {
        // Unknown login and wrong password must be indistinguishable.
        let a = ApiError::InvalidCredentials.to_string();
        let b = ApiError::InvalidCredentials.to_string();
        assert_eq!(a, b);
        assert!(!a.to_lowercase().contains("email"));
        assert!(!a.to_lowercase().contains("not found"));
    }
}
