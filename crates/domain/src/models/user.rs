//! User directory models referenced by the invitation flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role held by a user. Stored as a small integer; the numeric values are
/// part of the persisted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Supervisor,
    SchoolManager,
    Parent,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Admin,
        UserRole::Supervisor,
        UserRole::SchoolManager,
        UserRole::Parent,
    ];

    pub fn as_i16(&self) -> i16 {
        match self {
            UserRole::Admin => 0,
            UserRole::Supervisor => 1,
            UserRole::SchoolManager => 2,
            UserRole::Parent => 3,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(UserRole::Admin),
            1 => Some(UserRole::Supervisor),
            2 => Some(UserRole::SchoolManager),
            3 => Some(UserRole::Parent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Supervisor => "supervisor",
            UserRole::SchoolManager => "school_manager",
            UserRole::Parent => "parent",
        }
    }

    /// Arabic display label.
    pub fn label(&self) -> &'static str {
        match self {
            UserRole::Admin => "مدير النظام",
            UserRole::Supervisor => "مشرف",
            UserRole::SchoolManager => "مدير مدرسة",
            UserRole::Parent => "ولي أمر",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("Invalid user role: {}", s))
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Account lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Pending,
    Active,
    Suspended,
    Rejected,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "pending",
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
            UserStatus::Rejected => "rejected",
        }
    }

    /// Arabic display label.
    pub fn label(&self) -> &'static str {
        match self {
            UserStatus::Pending => "قيد الانتظار",
            UserStatus::Active => "نشط",
            UserStatus::Suspended => "موقوف",
            UserStatus::Rejected => "مرفوض",
        }
    }

    /// Only active accounts may act on the API.
    pub fn can_sign_in(&self) -> bool {
        matches!(self, UserStatus::Active)
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(UserStatus::Pending),
            "active" => Ok(UserStatus::Active),
            "suspended" => Ok(UserStatus::Suspended),
            "rejected" => Ok(UserStatus::Rejected),
            _ => Err(format!("Invalid user status: {}", s)),
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    /// Account credited with the invitation this user registered through.
    pub invited_by: Option<Uuid>,
    pub invitation_link_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_integer_mapping_is_stable() {
        assert_eq!(UserRole::Admin.as_i16(), 0);
        assert_eq!(UserRole::Supervisor.as_i16(), 1);
        assert_eq!(UserRole::SchoolManager.as_i16(), 2);
        assert_eq!(UserRole::Parent.as_i16(), 3);
        for role in UserRole::ALL {
            assert_eq!(UserRole::from_i16(role.as_i16()), Some(role));
        }
        assert_eq!(UserRole::from_i16(4), None);
        assert_eq!(UserRole::from_i16(-1), None);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!(
            "SCHOOL_MANAGER".parse::<UserRole>().unwrap(),
            UserRole::SchoolManager
        );
        assert!("student".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_labels_are_distinct() {
        let labels: std::collections::HashSet<_> =
            UserRole::ALL.iter().map(|r| r.label()).collect();
        assert_eq!(labels.len(), UserRole::ALL.len());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(
            serde_json::to_string(&UserRole::SchoolManager).unwrap(),
            "\"school_manager\""
        );
    }

    #[test]
    fn test_status_round_trip_and_labels() {
        for status in [
            UserStatus::Pending,
            UserStatus::Active,
            UserStatus::Suspended,
            UserStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<UserStatus>().unwrap(), status);
            assert!(!status.label().is_empty());
        }
        assert!("deleted".parse::<UserStatus>().is_err());
    }

    #[test]
    fn test_only_active_can_sign_in() {
        assert!(UserStatus::Active.can_sign_in());
        assert!(!UserStatus::Pending.can_sign_in());
        assert!(!UserStatus::Suspended.can_sign_in());
        assert!(!UserStatus::Rejected.can_sign_in());
    }
}
