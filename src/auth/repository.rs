// User repositories: Postgres for the server, in-memory for tests and local runs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::{
    error::AuthError,
    models::{AccountStatus, Role, User},
    rbac::RoleSet,
};

/// Storage seam for user records
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by email (case-insensitive)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError>;

    /// Users whose role is in the given set, ordered by id
    async fn list_by_roles(&self, roles: &RoleSet) -> Result<Vec<User>, AuthError>;

    async fn update_last_login(&self, id: i32) -> Result<(), AuthError>;

    /// Store a new hash and clear the force-password-change flag
    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), AuthError>;
}

/// Raw row as stored in Postgres
#[derive(Debug, FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    phone: Option<String>,
    password_hash: String,
    role: String,
    status: String,
    force_password_change: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| AuthError::CorruptRecord(format!("user {}: {}", row.id, e)))?;
        let status: AccountStatus = row
            .status
            .parse()
            .map_err(|e| AuthError::CorruptRecord(format!("user {}: {}", row.id, e)))?;

        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            role,
            status,
            force_password_change: row.force_password_change,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, name, email, phone, password_hash, role, status, \
                            force_password_change, last_login_at, created_at";

/// Postgres-backed user repository
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let query = format!("SELECT {} FROM users WHERE LOWER(email) = LOWER($1)", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn list_by_roles(&self, roles: &RoleSet) -> Result<Vec<User>, AuthError> {
        let role_names: Vec<String> = roles.roles().iter().map(|r| r.as_str().to_string()).collect();
        let query = format!("SELECT {} FROM users WHERE role = ANY($1) ORDER BY id", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&query)
            .bind(role_names)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }

    async fn update_last_login(&self, id: i32) -> Result<(), AuthError> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), AuthError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, force_password_change = FALSE WHERE id = $2",
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound(id));
        }
        Ok(())
    }
}

/// In-memory user repository
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<i32, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, AuthError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn list_by_roles(&self, roles: &RoleSet) -> Result<Vec<User>, AuthError> {
        let users = self.users.read().await;
        let mut matching: Vec<User> = users
            .values()
            .filter(|u| roles.contains(u.role))
            .cloned()
            .collect();
        matching.sort_by_key(|u| u.id);
        Ok(matching)
    }

    async fn update_last_login(&self, id: i32) -> Result<(), AuthError> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), AuthError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(&id).ok_or(AuthError::UserNotFound(id))?;
        user.password_hash = password_hash.to_string();
        user.force_password_change = false;
        Ok(())
    }
}
