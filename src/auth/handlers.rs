// HTTP handlers for authentication endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{
    middleware::AuthenticatedUser,
    models::{
        AdminIdentity, AdminLoginResponse, ChangePasswordRequest, LoginRequest, MeResponse,
        UserLoginResponse,
    },
};
use crate::error::ApiError;
use crate::AppState;

/// Response for the optional-auth status probe
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    pub user: Option<AuthenticatedUser>,
}

/// Login to the end-user app
/// POST /api/v1/auth/login
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = UserLoginResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Super admin or blocked account")
    ),
    tag = "auth"
)]
pub async fn user_login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<UserLoginResponse>, ApiError> {
    request.validate()?;
    let response = state
        .auth_service
        .login_user(&request.email, &request.password)
        .await?;
    Ok(Json(response))
}

/// Login to the admin console
/// POST /admin/v1/auth/login
#[utoipa::path(
    post,
    path = "/admin/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AdminLoginResponse),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid email or password"),
        (status = 403, description = "Not an admin role or blocked account")
    ),
    tag = "admin"
)]
pub async fn admin_login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AdminLoginResponse>, ApiError> {
    request.validate()?;
    let response = state
        .auth_service
        .login_admin(&request.email, &request.password)
        .await?;
    Ok(Json(response))
}

/// Get current user information (required auth)
/// GET /api/v1/me
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User no longer exists")
    ),
    tag = "auth"
)]
pub async fn me_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<MeResponse>, ApiError> {
    let record = state.auth_service.current_user(user.user_id).await?;
    Ok(Json(MeResponse::from(record)))
}

/// Change the caller's password
/// POST /api/v1/me/change-password
#[utoipa::path(
    post,
    path = "/api/v1/me/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "New password rejected"),
        (status = 401, description = "Missing token or wrong current password"),
        (status = 403, description = "Role not permitted")
    ),
    tag = "auth"
)]
pub async fn change_password_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;
    state
        .auth_service
        .change_password(user.user_id, &request.current_password, &request.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Report whether the request carried a usable token (optional auth)
/// GET /api/v1/auth/status
#[utoipa::path(
    get,
    path = "/api/v1/auth/status",
    responses(
        (status = 200, description = "Authentication status", body = AuthStatusResponse)
    ),
    tag = "auth"
)]
pub async fn auth_status_handler(user: Option<AuthenticatedUser>) -> Json<AuthStatusResponse> {
    Json(AuthStatusResponse {
        authenticated: user.is_some(),
        user,
    })
}

/// Admin profile of the caller
/// GET /admin/v1/me
#[utoipa::path(
    get,
    path = "/admin/v1/me",
    responses(
        (status = 200, description = "Current admin", body = AdminIdentity),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not an admin role")
    ),
    tag = "admin"
)]
pub async fn admin_me_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<AdminIdentity>, ApiError> {
    let record = state.auth_service.current_user(user.user_id).await?;
    Ok(Json(AdminIdentity::from(&record)))
}

/// List admin-domain accounts
/// GET /admin/v1/admins
#[utoipa::path(
    get,
    path = "/admin/v1/admins",
    responses(
        (status = 200, description = "Admin accounts", body = Vec<AdminIdentity>),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not an admin role")
    ),
    tag = "admin"
)]
pub async fn list_admins_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminIdentity>>, ApiError> {
    let admins = state.auth_service.list_admins().await?;
    Ok(Json(admins))
}

/// Get one admin account (super admin only)
/// GET /admin/v1/admins/:id
#[utoipa::path(
    get,
    path = "/admin/v1/admins/{id}",
    params(
        ("id" = i32, Path, description = "Admin user id")
    ),
    responses(
        (status = 200, description = "Admin account", body = AdminIdentity),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not a super admin"),
        (status = 404, description = "No admin with this id")
    ),
    tag = "admin"
)]
pub async fn get_admin_handler(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AdminIdentity>, ApiError> {
    let admin = state.auth_service.get_admin(id).await?;
    Ok(Json(admin))
}
