pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod session;

use axum::{
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use auth::{
    handlers::{self, AuthStatusResponse},
    models::{
        AdminIdentity, AdminLoginResponse, ChangePasswordRequest, LoginRequest, MeResponse, Role,
        UserIdentity, UserLoginResponse,
    },
    optional_auth, require_auth, require_role, AuthService, AuthenticatedUser, Capability,
    RequireRole, TokenCodec,
};
use error::ErrorResponse;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::user_login_handler,
        handlers::admin_login_handler,
        handlers::me_handler,
        handlers::change_password_handler,
        handlers::auth_status_handler,
        handlers::admin_me_handler,
        handlers::list_admins_handler,
        handlers::get_admin_handler,
    ),
    components(
        schemas(
            Role,
            LoginRequest,
            UserLoginResponse,
            AdminLoginResponse,
            UserIdentity,
            AdminIdentity,
            MeResponse,
            ChangePasswordRequest,
            AuthStatusResponse,
            AuthenticatedUser,
            ErrorResponse,
        )
    ),
    tags(
        (name = "auth", description = "End-user authentication and account endpoints"),
        (name = "admin", description = "Admin console authentication endpoints")
    ),
    info(
        title = "Wellness Auth API",
        version = "1.0.0",
        description = "Token authentication and role-based access for the wellness app and admin console"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub token_codec: Arc<TokenCodec>,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>, token_codec: Arc<TokenCodec>) -> Self {
        Self {
            auth_service,
            token_codec,
        }
    }
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Build the router.
///
/// Partitions: public, optional auth, and required auth. Role gates are
/// route layers added before `require_auth`, so they run after it.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/auth/login", post(handlers::user_login_handler))
        .route("/admin/v1/auth/login", post(handlers::admin_login_handler));

    let optional = Router::new()
        .route("/api/v1/auth/status", get(handlers::auth_status_handler))
        .route_layer(middleware::from_fn_with_state(
            state.token_codec.clone(),
            optional_auth,
        ));

    let account = Router::new()
        .route("/api/v1/me/change-password", post(handlers::change_password_handler))
        .route_layer(middleware::from_fn_with_state(
            RequireRole::for_capability(Capability::ChangeOwnPassword),
            require_role,
        ));

    let admin_profile = Router::new()
        .route("/admin/v1/me", get(handlers::admin_me_handler))
        .route_layer(middleware::from_fn_with_state(
            RequireRole::for_capability(Capability::ViewAdminProfile),
            require_role,
        ));

    let admin_listing = Router::new()
        .route("/admin/v1/admins", get(handlers::list_admins_handler))
        .route_layer(middleware::from_fn_with_state(
            RequireRole::for_capability(Capability::ListAdmins),
            require_role,
        ));

    let admin_account = Router::new()
        .route("/admin/v1/admins/:id", get(handlers::get_admin_handler))
        .route_layer(middleware::from_fn_with_state(
            RequireRole::for_capability(Capability::ViewAdminAccount),
            require_role,
        ));

    let required = Router::new()
        .route("/api/v1/me", get(handlers::me_handler))
        .merge(account)
        .merge(admin_profile)
        .merge(admin_listing)
        .merge(admin_account)
        .route_layer(middleware::from_fn_with_state(
            state.token_codec.clone(),
            require_auth,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public)
        .merge(optional)
        .merge(required)
        .layer(cors)
        .with_state(state)
}
