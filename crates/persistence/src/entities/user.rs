//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{User, UserRole, UserStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for user_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
pub enum UserStatusDb {
    Pending,
    Active,
    Suspended,
    Rejected,
}

impl From<UserStatusDb> for UserStatus {
    fn from(db_status: UserStatusDb) -> Self {
        match db_status {
            UserStatusDb::Pending => UserStatus::Pending,
            UserStatusDb::Active => UserStatus::Active,
            UserStatusDb::Suspended => UserStatus::Suspended,
            UserStatusDb::Rejected => UserStatus::Rejected,
        }
    }
}

impl From<UserStatus> for UserStatusDb {
    fn from(status: UserStatus) -> Self {
        match status {
            UserStatus::Pending => UserStatusDb::Pending,
            UserStatus::Active => UserStatusDb::Active,
            UserStatus::Suspended => UserStatusDb::Suspended,
            UserStatus::Rejected => UserStatusDb::Rejected,
        }
    }
}

/// Maps the stored role integer, falling back to the least privileged role.
pub fn role_from_db(value: i16) -> UserRole {
    UserRole::from_i16(value).unwrap_or(UserRole::Parent)
}

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    pub role: i16,
    pub status: UserStatusDb,
    pub invited_by: Option<Uuid>,
    pub invitation_link_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            password_hash: entity.password_hash,
            phone: entity.phone,
            role: role_from_db(entity.role),
            status: entity.status.into(),
            invited_by: entity.invited_by,
            invitation_link_id: entity.invitation_link_id,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Role and status of a user, loaded by authorization guards.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct UserRoleEntity {
    pub role: i16,
    pub status: UserStatusDb,
}
