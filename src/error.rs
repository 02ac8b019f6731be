use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Domain errors raised by the account lifecycle services. The transport
/// mapping to a status code and JSON envelope happens exactly once, in
/// [`IntoResponse`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("User already exists with this email")]
    DuplicateEmail,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Account is temporarily locked due to too many failed attempts")]
    AccountLocked,
    #[error("{0}")]
    InvalidToken(&'static str),
    #[error("Verification token has expired")]
    TokenExpired,
    #[error("User not found")]
    NotFound,
    #[error("Email is already verified")]
    AlreadyVerified,
    #[error("Service temporarily unavailable, please retry")]
    Transient,
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::DuplicateEmail | ApiError::AlreadyVerified => {
                StatusCode::BAD_REQUEST
            }
            ApiError::InvalidCredentials
            | ApiError::AccountLocked
            | ApiError::InvalidToken(_)
            | ApiError::TokenExpired => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Transient | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        // Internal detail stays in the logs outside of debug builds.
        let message = match &self {
            ApiError::Internal(_) if !cfg!(debug_assertions) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = ErrorBody {
            success: false,
            error: message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => ApiError::Transient,
            other => {
                // 23505: unique_violation, raised by the active-email index.
                if let Some(db) = other.as_database_error() {
                    if db.code().as_deref() == Some("23505") {
                        return ApiError::DuplicateEmail;
                    }
                }
                ApiError::Internal(other.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::DuplicateEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::AccountLocked.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::InvalidToken("Invalid or expired token").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::TokenExpired.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::AlreadyVerified.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Transient.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn credentials_message_does_not_leak_which_part_was_wrong() {
        // Unknown email and wrong password must be indistinguishable.
        assert_eq!(
            ApiError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn pool_timeout_maps_to_transient() {
        let err: ApiError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, ApiError::Transient));
    }

    #[test]
    fn error_body_shape() {
        let body = ErrorBody {
            success: false,
            error: "User not found".into(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"success":false,"error":"User not found"}"#);
    }
}
