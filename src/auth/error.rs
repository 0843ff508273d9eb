// Authentication and authorization error types

use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::auth::models::Role;
use crate::auth::rbac::RoleSet;
use crate::error::ApiError;

/// Authentication and authorization error types
#[derive(Debug, Error)]
pub enum AuthError {
    // Authentication errors
    /// No token, or a token that failed verification, on a required-auth path.
    /// The reason is only logged; clients always see the same message.
    #[error("Authentication required ({reason})")]
    Unauthenticated { reason: String },

    #[error("{0}")]
    InvalidCredentials(&'static str),

    #[error("Invalid password: {0}")]
    WeakPassword(String),

    // Authorization errors
    /// Valid identity whose role is outside the allowed set
    #[error("Insufficient permissions: role '{actual}' not in [{allowed}]")]
    InsufficientPermissions { allowed: RoleSet, actual: Role },

    /// Refusal decided by a login or account rule (wrong domain, blocked account)
    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    #[error("User {0} not found")]
    UserNotFound(i32),

    #[error("Admin {0} not found")]
    AdminNotFound(i32),

    // Internal errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Stored row that does not decode into a `User`
    #[error("Corrupt user record: {0}")]
    CorruptRecord(String),

    #[error("Password hashing error")]
    PasswordHashError,

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AuthError {
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        AuthError::Unauthenticated {
            reason: reason.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Unauthenticated { reason } => {
                tracing::debug!("Rejecting unauthenticated request: {}", reason);
                ApiError::Unauthorized("Authentication required".to_string())
            }
            AuthError::InvalidCredentials(message) => ApiError::Unauthorized(message.to_string()),
            AuthError::WeakPassword(message) => ApiError::BadRequest(message),
            AuthError::InsufficientPermissions { allowed, actual } => {
                tracing::debug!("Role {} not in [{}]", actual, allowed);
                ApiError::Forbidden("Access denied. Insufficient permissions.".to_string())
            }
            AuthError::Forbidden(message) => ApiError::Forbidden(message.to_string()),
            AuthError::UserNotFound(id) => ApiError::NotFound {
                resource: "User".to_string(),
                id: id.to_string(),
            },
            AuthError::AdminNotFound(id) => ApiError::NotFound {
                resource: "Admin".to_string(),
                id: id.to_string(),
            },
            AuthError::DatabaseError(error) => ApiError::DatabaseError(error),
            AuthError::CorruptRecord(detail) => {
                ApiError::InternalError(format!("user record: {}", detail))
            }
            AuthError::PasswordHashError => ApiError::InternalError("password hashing failed".to_string()),
            AuthError::TokenGenerationError(detail) => {
                ApiError::InternalError(format!("token generation: {}", detail))
            }
            AuthError::ConfigError(detail) => {
                ApiError::InternalError(format!("auth configuration: {}", detail))
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::from(AuthError::unauthenticated("missing header")).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials("Invalid credentials")).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InsufficientPermissions {
                allowed: RoleSet::admin(),
                actual: Role::User,
            })
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(AuthError::Forbidden("Account is blocked")).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(AuthError::WeakPassword("too short".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::UserNotFound(9)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(AuthError::AdminNotFound(9)).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(AuthError::CorruptRecord("bad role".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unauthenticated_reason_is_not_exposed() {
        match ApiError::from(AuthError::unauthenticated("signature mismatch")) {
            ApiError::Unauthorized(message) => {
                assert_eq!(message, "Authentication required");
            }
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn test_sqlx_errors_surface_as_database_errors() {
        let error = AuthError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(ApiError::from(error), ApiError::DatabaseError(_)));
    }
}
