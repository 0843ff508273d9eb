// Identity, role and request/response models for the auth core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

/// Role taxonomy shared by both identity domains.
///
/// The wire form is the case-sensitive upper-case name (`USER`, `COACH`,
/// `SUPER_ADMIN`), both in token claims and in persisted client identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Coach,
    SuperAdmin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Coach, Role::SuperAdmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Coach => "COACH",
            Role::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    // Case-sensitive on purpose: "user" is not a role.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "COACH" => Ok(Role::Coach),
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

/// Account status stored alongside a user record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Blocked,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Blocked => "blocked",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "blocked" => Ok(AccountStatus::Blocked),
            other => Err(format!("unknown account status '{}'", other)),
        }
    }
}

/// Server-side user record
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub status: AccountStatus,
    pub force_password_change: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Common view over the two identity variants.
pub trait Identity {
    fn id(&self) -> i32;
    fn email(&self) -> &str;
    fn role(&self) -> Role;

    /// Whether the identity must change its credentials before using the app.
    fn requires_password_change(&self) -> bool {
        false
    }

    /// Drops the must-change-credentials flag. No-op for identities without one.
    fn clear_password_change(&mut self) {}
}

/// End-user domain identity (`USER` or `COACH`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub force_password_change: bool,
}

impl Identity for UserIdentity {
    fn id(&self) -> i32 {
        self.id
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn role(&self) -> Role {
        self.role
    }

    fn requires_password_change(&self) -> bool {
        self.force_password_change
    }

    fn clear_password_change(&mut self) {
        self.force_password_change = false;
    }
}

impl From<&User> for UserIdentity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            force_password_change: user.force_password_change,
        }
    }
}

/// Admin domain identity (`SUPER_ADMIN` or `COACH`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminIdentity {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Identity for AdminIdentity {
    fn id(&self) -> i32 {
        self.id
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn role(&self) -> Role {
        self.role
    }
}

impl From<&User> for AdminIdentity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Login request DTO, shared by both domains
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email and password required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Email and password required"))]
    pub password: String,
}

/// End-user login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserLoginResponse {
    pub token: String,
    pub user: UserIdentity,
}

/// Admin login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminLoginResponse {
    pub token: String,
    pub user: AdminIdentity,
}

/// Response for GET /api/v1/me
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub force_password_change: bool,
}

impl From<User> for MeResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            phone: user.phone,
            force_password_change: user.force_password_change,
        }
    }
}

/// Change password request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format_is_upper_case() {
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"SUPER_ADMIN\"");
        assert_eq!(serde_json::from_str::<Role>("\"COACH\"").unwrap(), Role::Coach);
    }

    #[test]
    fn test_role_parse_is_case_sensitive() {
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert!("user".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
        assert!(serde_json::from_str::<Role>("\"coach\"").is_err());
    }

    #[test]
    fn test_user_identity_defaults_force_flag() {
        let identity: UserIdentity = serde_json::from_str(
            r#"{"id":3,"name":"Asha","email":"asha@example.com","role":"USER"}"#,
        )
        .unwrap();
        assert!(!identity.requires_password_change());

        let identity: UserIdentity = serde_json::from_str(
            r#"{"id":3,"name":"Asha","email":"asha@example.com","role":"USER","forcePasswordChange":true}"#,
        )
        .unwrap();
        assert!(identity.requires_password_change());
    }

    #[test]
    fn test_login_request_requires_both_fields() {
        let request: LoginRequest = serde_json::from_str(r#"{"email":"a@b.com"}"#).unwrap();
        assert!(request.validate().is_err());

        let request: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.com","password":"secret"}"#).unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_login_request_does_not_check_email_format() {
        let request: LoginRequest =
            serde_json::from_str(r#"{"email":"not-an-email","password":"secret"}"#).unwrap();
        assert!(request.validate().is_ok());
    }
}
