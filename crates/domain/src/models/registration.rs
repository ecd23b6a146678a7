//! Self-registration through an invitation link.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::invitation_link::{InvitationLink, LinkType};
use super::user::{UserRole, UserStatus};

/// Registration form submitted with a link token.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RedeemLinkRequest {
    #[validate(
        length(max = 255, message = "الاسم يجب ألا يتجاوز 255 حرفاً"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub name: String,

    #[validate(email(message = "البريد الإلكتروني غير صالح"))]
    pub email: String,

    #[validate(custom(function = "shared::password::validate_password_strength"))]
    pub password: String,

    #[validate(custom(function = "shared::validation::validate_phone"))]
    pub phone: Option<String>,
}

impl RedeemLinkRequest {
    /// Emails are stored lowercased and trimmed.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

/// Registrant data ready to be persisted. Role and inviter come from the
/// link claimed during redemption.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
}

/// Outcome of a successful redemption.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationContext {
    pub user_id: Uuid,
    pub role: UserRole,
    pub status: UserStatus,
    pub link_id: Uuid,
    pub link_type: LinkType,
    pub institution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invited_by: Option<Uuid>,
    pub registered_at: DateTime<Utc>,
}

impl RegistrationContext {
    /// Context for a user just registered through `link`. New accounts always
    /// start pending, whatever the link type.
    ///
    /// `invited_by` is the inviter as resolved at redemption time: the
    /// candidate from [`inviter_of`] if that account still exists.
    pub fn new(
        link: &InvitationLink,
        user_id: Uuid,
        invited_by: Option<Uuid>,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            role: link.link_type.granted_role(),
            status: UserStatus::Pending,
            link_id: link.id,
            link_type: link.link_type,
            institution: link.organization_name.clone(),
            invited_by,
            registered_at,
        }
    }
}

/// Account to credit with a registration through `link`. Principal links
/// record the issuing supervisor as the inviter.
pub fn inviter_of(link: &InvitationLink) -> Option<Uuid> {
    match link.link_type {
        LinkType::Principal => link.organization_id.or(link.created_by),
        LinkType::Supervisor => link.created_by,
    }
}
