// Authentication module
// JWT verification, the auth/RBAC gates, and the login/account endpoints behind them

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod rbac;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use error::AuthError;
pub use handlers::{
    admin_login_handler, admin_me_handler, auth_status_handler, change_password_handler,
    get_admin_handler, list_admins_handler, me_handler, user_login_handler,
};
pub use middleware::{authenticate, optional_auth, require_auth, AuthMode, AuthOutcome, AuthenticatedUser};
pub use models::{AdminIdentity, Identity, Role, User, UserIdentity};
pub use rbac::{authorize, require_role, Capability, RequireRole, RoleSet};
pub use repository::{InMemoryUserRepository, PgUserRepository, UserRepository};
pub use service::AuthService;
pub use token::{Claims, TokenCodec, TokenError};
