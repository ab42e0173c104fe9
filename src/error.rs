use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::response;

/// Domain errors surfaced by handlers. Converted into the response envelope
/// at the boundary; 5xx variants keep their source server-side only.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("user with this email already exists")]
    DuplicateAccount,
    #[error("user not found")]
    AccountNotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("could not hash password")]
    Hashing(#[source] anyhow::Error),
    #[error("could not sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("database error")]
    Storage(#[source] sqlx::Error),
    #[error("could not save profile image")]
    AvatarSave(#[source] anyhow::Error),
    #[error("user deleted but profile image could not be removed")]
    AvatarCleanup(#[source] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::DuplicateAccount => StatusCode::CONFLICT,
            ApiError::AccountNotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidCredentials | ApiError::InvalidToken | ApiError::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Hashing(_)
            | ApiError::Signing(_)
            | ApiError::Storage(_)
            | ApiError::AvatarSave(_)
            | ApiError::AvatarCleanup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => ApiError::AccountNotFound,
            // The unique constraint on users.email is the sole duplicate
            // arbiter; 23505 is Postgres unique_violation.
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                ApiError::DuplicateAccount
            }
            _ => ApiError::Storage(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        } else {
            warn!(error = %self, "request rejected");
        }
        let message = self.to_string();
        response::error(status, message.clone(), message)
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
        assert_eq!(ApiError::DuplicateAccount.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::AccountNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::ExpiredToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::AvatarCleanup(anyhow::anyhow!("io")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn row_not_found_maps_to_account_not_found() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::AccountNotFound));
    }

    #[derive(Debug)]
    struct UniqueViolation;

    impl std::fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("duplicate key value violates unique constraint \"users_email_key\"")
        }
    }

    impl std::error::Error for UniqueViolation {}

    impl sqlx::error::DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint \"users_email_key\""
        }
        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some("23505".into())
        }
        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }
        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }
        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violation_maps_to_duplicate_account() {
        let err: ApiError = sqlx::Error::Database(Box::new(UniqueViolation)).into();
        assert!(matches!(err, ApiError::DuplicateAccount));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn server_errors_redact_detail() {
        let err = ApiError::Storage(sqlx::Error::PoolTimedOut);
        // The client-facing message must not carry the library error text.
        assert_eq!(err.to_string(), "database error");
    }
}
