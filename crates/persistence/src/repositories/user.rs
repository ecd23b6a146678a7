//! User repository for database operations.

use domain::models::{User, UserRole, UserStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::user::role_from_db;
use crate::entities::{UserEntity, UserRoleEntity, UserStatusDb};
use crate::metrics::QueryTimer;

/// Input for inserting a user outside the invitation flow.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: Option<&'a str>,
    pub role: UserRole,
    pub status: UserStatus,
}

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, name, email, password_hash, phone, role, status, invited_by,
                   invitation_link_id, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|entity| entity.map(Into::into))
    }

    /// Find a user by email address. Emails are stored lowercased.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_email");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, name, email, password_hash, phone, role, status, invited_by,
                   invitation_link_id, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|entity| entity.map(Into::into))
    }

    /// Load only the role and status of a user, for authorization checks.
    pub async fn find_role(&self, id: Uuid) -> Result<Option<(UserRole, UserStatus)>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_role");
        let result = sqlx::query_as::<_, UserRoleEntity>(
            "SELECT role, status FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|row| row.map(|r| (role_from_db(r.role), r.status.into())))
    }

    /// Create a user account directly.
    pub async fn create(&self, input: NewUser<'_>) -> Result<User, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (name, email, password_hash, role, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, phone, role, status, invited_by,
                      invitation_link_id, created_at, updated_at
            "#,
        )
        .bind(input.name)
        .bind(input.email.trim().to_lowercase())
        .bind(input.password_hash)
        .bind(input.role.as_i16())
        .bind(UserStatusDb::from(input.status))
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into)
    }
}
