// Authentication middleware for protected and optional-auth routes

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::auth::{
    error::AuthError,
    models::Role,
    token::{Claims, TokenCodec, TokenError},
};

pub const BEARER_PREFIX: &str = "Bearer ";

/// Identity attached to a request once its token has been verified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Whether a route rejects or tolerates requests without a valid token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Required,
    Optional,
}

/// Result of running the gate on a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(AuthenticatedUser),
    Anonymous,
}

/// Pull the bearer token out of the Authorization header.
///
/// `None` when the header is absent; `Some(Err)` when it is present but
/// unusable (non-ASCII, wrong scheme, empty token).
fn bearer_token(headers: &HeaderMap) -> Option<Result<&str, TokenError>> {
    let value = headers.get(header::AUTHORIZATION)?;
    Some(
        value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(TokenError::Malformed),
    )
}

/// Decide the outcome for a request's headers.
///
/// Required mode rejects missing or failing tokens with `Unauthenticated`.
/// Optional mode downgrades both to `Anonymous`; the bad token is not surfaced.
pub fn authenticate(
    headers: &HeaderMap,
    codec: &TokenCodec,
    mode: AuthMode,
) -> Result<AuthOutcome, AuthError> {
    let verified = match bearer_token(headers) {
        None => {
            return match mode {
                AuthMode::Required => Err(AuthError::unauthenticated("missing Authorization header")),
                AuthMode::Optional => Ok(AuthOutcome::Anonymous),
            };
        }
        Some(token) => token.and_then(|t| codec.verify(t)),
    };

    match (verified, mode) {
        (Ok(claims), _) => Ok(AuthOutcome::Authenticated(claims.into())),
        (Err(e), AuthMode::Required) => Err(AuthError::unauthenticated(e.to_string())),
        (Err(e), AuthMode::Optional) => {
            debug!("Ignoring unusable token on optional-auth route: {}", e);
            Ok(AuthOutcome::Anonymous)
        }
    }
}

async fn run_gate(
    codec: &TokenCodec,
    mode: AuthMode,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let outcome = authenticate(request.headers(), codec, mode).map_err(|err| {
        warn!("Rejected request to {}: {}", request.uri().path(), err);
        err
    })?;

    if let AuthOutcome::Authenticated(user) = outcome {
        debug!(
            "Authenticated user_id={}, role={}, endpoint={}",
            user.user_id,
            user.role,
            request.uri().path()
        );
        request.extensions_mut().insert(user);
    }
    Ok(next.run(request).await)
}

/// Middleware for required-auth routes
pub async fn require_auth(
    State(codec): State<Arc<TokenCodec>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    run_gate(&codec, AuthMode::Required, request, next).await
}

/// Middleware for optional-auth routes
pub async fn optional_auth(
    State(codec): State<Arc<TokenCodec>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    run_gate(&codec, AuthMode::Optional, request, next).await
}

/// Extractor for handlers behind `require_auth`.
///
/// Use `Option<AuthenticatedUser>` behind `optional_auth`.
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AuthError::unauthenticated("no identity attached to request"))
    }
}
