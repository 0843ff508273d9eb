// Role-based access control: allowed-role sets and the RBAC gate

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::fmt;
use tracing::{debug, warn};

use crate::auth::{error::AuthError, middleware::AuthenticatedUser, models::Role};

/// Non-empty set of roles permitted on a route or endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSet {
    roles: Vec<Role>,
}

impl RoleSet {
    /// Build a role set. An empty set would lock everyone out and is rejected.
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Result<Self, AuthError> {
        let mut roles: Vec<Role> = roles.into_iter().collect();
        roles.sort();
        roles.dedup();

        if roles.is_empty() {
            return Err(AuthError::ConfigError(
                "allowed-role set must not be empty".to_string(),
            ));
        }
        Ok(Self { roles })
    }

    /// Any authenticated end-user role: `USER` or `COACH`
    pub fn end_user() -> Self {
        Self {
            roles: vec![Role::User, Role::Coach],
        }
    }

    /// Admin roles: `COACH` or `SUPER_ADMIN`
    pub fn admin() -> Self {
        Self {
            roles: vec![Role::Coach, Role::SuperAdmin],
        }
    }

    /// `SUPER_ADMIN` only
    pub fn super_admin() -> Self {
        Self {
            roles: vec![Role::SuperAdmin],
        }
    }

    pub fn contains(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.roles.iter().map(Role::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

/// Logical capabilities guarded by the static RBAC policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ChangeOwnPassword,
    ViewAdminProfile,
    ListAdmins,
    ViewAdminAccount,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::ChangeOwnPassword,
        Capability::ViewAdminProfile,
        Capability::ListAdmins,
        Capability::ViewAdminAccount,
    ];

    /// Static policy: capability -> allowed roles
    pub fn allowed_roles(self) -> RoleSet {
        match self {
            Capability::ChangeOwnPassword => RoleSet::end_user(),
            Capability::ViewAdminProfile => RoleSet::admin(),
            Capability::ListAdmins => RoleSet::admin(),
            Capability::ViewAdminAccount => RoleSet::super_admin(),
        }
    }
}

/// Check an already-attached identity against an allowed-role set.
///
/// Never looks at tokens; it only sees what the auth middleware attached.
pub fn authorize(identity: Option<&AuthenticatedUser>, allowed: &RoleSet) -> Result<(), AuthError> {
    let user = identity.ok_or_else(|| AuthError::unauthenticated("no identity attached"))?;

    if !allowed.contains(user.role) {
        return Err(AuthError::InsufficientPermissions {
            allowed: allowed.clone(),
            actual: user.role,
        });
    }
    Ok(())
}

/// Authorization middleware that requires one of a set of roles.
///
/// Must be layered inside `require_auth` (or `optional_auth`), so the identity
/// is already in the request extensions when it runs.
#[derive(Debug, Clone)]
pub struct RequireRole {
    allowed: RoleSet,
}

impl RequireRole {
    pub fn new(allowed: RoleSet) -> Self {
        Self { allowed }
    }

    pub fn end_user() -> Self {
        Self::new(RoleSet::end_user())
    }

    pub fn admin() -> Self {
        Self::new(RoleSet::admin())
    }

    pub fn for_capability(capability: Capability) -> Self {
        Self::new(capability.allowed_roles())
    }

    pub fn allowed(&self) -> &RoleSet {
        &self.allowed
    }

    /// Middleware function that validates role-based access
    pub async fn middleware(self, request: Request, next: Next) -> Result<Response, AuthError> {
        let endpoint = request.uri().path().to_string();
        let identity = request.extensions().get::<AuthenticatedUser>();

        if let Err(err) = authorize(identity, &self.allowed) {
            match identity {
                Some(user) => warn!(
                    "Authorization failed: user_id={}, allowed_roles=[{}], actual_role={}, endpoint={}",
                    user.user_id, self.allowed, user.role, endpoint
                ),
                None => warn!("No identity attached for role-gated endpoint: {}", endpoint),
            }
            return Err(err);
        }

        if let Some(user) = identity {
            debug!(
                "Authorization successful: user_id={}, role={}, endpoint={}",
                user.user_id, user.role, endpoint
            );
        }
        Ok(next.run(request).await)
    }
}

/// `from_fn_with_state` entry point for a `RequireRole` gate
pub async fn require_role(
    State(gate): State<RequireRole>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    gate.middleware(request, next).await
}
