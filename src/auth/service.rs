// Authentication service - business logic layer

use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{
    error::AuthError,
    models::{
        AccountStatus, AdminIdentity, AdminLoginResponse, Identity, Role, User, UserIdentity,
        UserLoginResponse,
    },
    password::PasswordService,
    rbac::RoleSet,
    repository::UserRepository,
    token::TokenCodec,
};

/// Which login surface a credential check is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginDomain {
    EndUser,
    Admin,
}

/// Authentication service coordinating login and account operations
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenCodec>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<TokenCodec>) -> Self {
        Self { users, tokens }
    }

    /// Login to the end-user app (`USER` or `COACH`)
    pub async fn login_user(&self, email: &str, password: &str) -> Result<UserLoginResponse, AuthError> {
        let user = self.check_credentials(LoginDomain::EndUser, email, password).await?;
        let identity = UserIdentity::from(&user);
        let token = self.issue(&identity)?;
        Ok(UserLoginResponse { token, user: identity })
    }

    /// Login to the admin console (`SUPER_ADMIN` or `COACH`)
    pub async fn login_admin(&self, email: &str, password: &str) -> Result<AdminLoginResponse, AuthError> {
        let user = self.check_credentials(LoginDomain::Admin, email, password).await?;
        let identity = AdminIdentity::from(&user);
        let token = self.issue(&identity)?;
        Ok(AdminLoginResponse { token, user: identity })
    }

    /// Check order: lookup, domain role, account status, password.
    async fn check_credentials(
        &self,
        domain: LoginDomain,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let bad_credentials = match domain {
            LoginDomain::EndUser => "Invalid credentials",
            LoginDomain::Admin => "Invalid email or password",
        };

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials(bad_credentials))?;

        match domain {
            LoginDomain::EndUser if user.role == Role::SuperAdmin => {
                warn!("Super admin {} attempted end-user login", user.id);
                return Err(AuthError::Forbidden("Super Admin must use admin login"));
            }
            LoginDomain::Admin if !RoleSet::admin().contains(user.role) => {
                warn!("User {} with role {} attempted admin login", user.id, user.role);
                return Err(AuthError::Forbidden("Admin access required"));
            }
            _ => {}
        }

        if user.status != AccountStatus::Active {
            warn!("Blocked account {} attempted login", user.id);
            return Err(AuthError::Forbidden("Account is blocked"));
        }

        if !PasswordService::verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials(bad_credentials));
        }

        self.users.update_last_login(user.id).await?;
        info!("User {} logged in ({:?} domain, role {})", user.id, domain, user.role);
        Ok(user)
    }

    fn issue<I: Identity>(&self, identity: &I) -> Result<String, AuthError> {
        self.tokens
            .issue(identity)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Get the stored record behind a verified token
    pub async fn current_user(&self, user_id: i32) -> Result<User, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound(user_id))
    }

    /// Change the caller's password; also clears any forced-change flag
    pub async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self.current_user(user_id).await?;

        if !PasswordService::verify_password(current_password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials("Current password is incorrect"));
        }
        PasswordService::validate_password_strength(new_password)?;

        let hash = PasswordService::hash_password(new_password)?;
        self.users.update_password(user_id, &hash).await?;
        info!("User {} changed password", user_id);
        Ok(())
    }

    /// All admin-domain accounts
    pub async fn list_admins(&self) -> Result<Vec<AdminIdentity>, AuthError> {
        let admins = self.users.list_by_roles(&RoleSet::admin()).await?;
        Ok(admins.iter().map(AdminIdentity::from).collect())
    }

    /// One admin-domain account; end-user accounts are not visible here
    pub async fn get_admin(&self, id: i32) -> Result<AdminIdentity, AuthError> {
        self.users
            .find_by_id(id)
            .await?
            .filter(|user| RoleSet::admin().contains(user.role))
            .map(|user| AdminIdentity::from(&user))
            .ok_or(AuthError::AdminNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::InMemoryUserRepository;
    use chrono::Utc;

    const SECRET: &str = "test_secret_key_for_testing_purposes";

    fn user(id: i32, email: &str, role: Role, status: AccountStatus) -> User {
        User {
            id,
            name: format!("User {}", id),
            email: email.to_string(),
            phone: None,
            password_hash: PasswordService::hash_password("Secret@123").unwrap(),
            role,
            status,
            force_password_change: false,
            last_login_at: None,
            created_at: Utc::now(),
        }
    }

    async fn service() -> (AuthService, InMemoryUserRepository) {
        let repo = InMemoryUserRepository::new();
        repo.insert(user(1, "user@example.com", Role::User, AccountStatus::Active)).await;
        repo.insert(user(2, "coach@example.com", Role::Coach, AccountStatus::Active)).await;
        repo.insert(user(3, "root@example.com", Role::SuperAdmin, AccountStatus::Active)).await;
        repo.insert(user(4, "blocked@example.com", Role::User, AccountStatus::Blocked)).await;

        let service = AuthService::new(Arc::new(repo.clone()), Arc::new(TokenCodec::new(SECRET)));
        (service, repo)
    }

    #[tokio::test]
    async fn test_user_login_issues_verifiable_token() {
        let (service, repo) = service().await;
        let response = service.login_user("user@example.com", "Secret@123").await.unwrap();

        let claims = TokenCodec::new(SECRET).verify(&response.token).unwrap();
        assert_eq!(claims.sub, 1);
        assert_eq!(claims.role, Role::User);
        assert_eq!(response.user.email, "user@example.com");
        assert!(repo.find_by_id(1).await.unwrap().unwrap().last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_coach_can_use_both_domains() {
        let (service, _) = service().await;
        let as_user = service.login_user("coach@example.com", "Secret@123").await.unwrap();
        let as_admin = service.login_admin("coach@example.com", "Secret@123").await.unwrap();

        assert_eq!(as_user.user.role, Role::Coach);
        assert_eq!(as_admin.user.role, Role::Coach);
    }

    #[tokio::test]
    async fn test_domain_role_rules() {
        let (service, _) = service().await;

        assert!(matches!(
            service.login_user("root@example.com", "Secret@123").await,
            Err(AuthError::Forbidden("Super Admin must use admin login"))
        ));
        assert!(matches!(
            service.login_admin("user@example.com", "Secret@123").await,
            Err(AuthError::Forbidden("Admin access required"))
        ));
    }

    #[tokio::test]
    async fn test_blocked_and_bad_credentials() {
        let (service, _) = service().await;

        assert!(matches!(
            service.login_user("blocked@example.com", "Secret@123").await,
            Err(AuthError::Forbidden("Account is blocked"))
        ));
        assert!(matches!(
            service.login_user("user@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials(_))
        ));
        assert!(matches!(
            service.login_admin("nobody@example.com", "Secret@123").await,
            Err(AuthError::InvalidCredentials("Invalid email or password"))
        ));
    }

    #[tokio::test]
    async fn test_change_password() {
        let (service, _) = service().await;

        assert!(matches!(
            service.change_password(1, "wrong", "NewPass@1").await,
            Err(AuthError::InvalidCredentials(_))
        ));
        assert!(matches!(
            service.change_password(1, "Secret@123", "abc").await,
            Err(AuthError::WeakPassword(_))
        ));

        service.change_password(1, "Secret@123", "NewPass@1").await.unwrap();
        assert!(service.login_user("user@example.com", "NewPass@1").await.is_ok());
        assert!(service.login_user("user@example.com", "Secret@123").await.is_err());
    }

    #[tokio::test]
    async fn test_list_admins() {
        let (service, _) = service().await;
        let admins = service.list_admins().await.unwrap();
        let ids: Vec<i32> = admins.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_get_admin_hides_end_user_accounts() {
        let (service, _) = service().await;

        assert_eq!(service.get_admin(2).await.unwrap().role, Role::Coach);
        assert!(matches!(service.get_admin(1).await, Err(AuthError::AdminNotFound(1))));
        assert!(matches!(service.get_admin(99).await, Err(AuthError::AdminNotFound(99))));
    }
}
