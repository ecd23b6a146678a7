//! Invitation link domain models.
//!
//! An invitation link is an opaque token that lets a new user self-register
//! with a given role under the organization (or supervisor) that issued it.
//! Links are redeemable only while active, unexpired and below their usage cap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::user::UserRole;

/// Upper bound for `max_uses` on a single link.
pub const MAX_USAGES: i32 = 100;

/// Maximum length of the organization label.
pub const MAX_INSTITUTION_LENGTH: u64 = 255;

/// Default and maximum page sizes for link listings.
pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// Kind of account an invitation link registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Supervisor,
    Principal,
}

impl LinkType {
    pub const ALL: [LinkType; 2] = [LinkType::Supervisor, LinkType::Principal];

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Supervisor => "supervisor",
            LinkType::Principal => "principal",
        }
    }

    /// Arabic display label.
    pub fn label(&self) -> &'static str {
        match self {
            LinkType::Supervisor => "رابط تسجيل مشرف",
            LinkType::Principal => "رابط تسجيل مدير مدرسة",
        }
    }

    /// Role assigned to accounts created through a link of this type.
    pub fn granted_role(&self) -> UserRole {
        match self {
            LinkType::Supervisor => UserRole::Supervisor,
            LinkType::Principal => UserRole::SchoolManager,
        }
    }
}

impl Default for LinkType {
    fn default() -> Self {
        LinkType::Supervisor
    }
}

impl FromStr for LinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supervisor" => Ok(LinkType::Supervisor),
            "principal" => Ok(LinkType::Principal),
            _ => Err(format!("Invalid link type: {}", s)),
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Administrative on/off switch of a link, derived from `is_active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Active,
    Inactive,
}

impl LinkStatus {
    pub fn from_active(is_active: bool) -> Self {
        if is_active {
            LinkStatus::Active
        } else {
            LinkStatus::Inactive
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, LinkStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Active => "active",
            LinkStatus::Inactive => "inactive",
        }
    }

    /// Arabic display label.
    pub fn label(&self) -> &'static str {
        match self {
            LinkStatus::Active => "نشط",
            LinkStatus::Inactive => "غير نشط",
        }
    }
}

impl FromStr for LinkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(LinkStatus::Active),
            "inactive" => Ok(LinkStatus::Inactive),
            _ => Err(format!("Invalid link status: {}", s)),
        }
    }
}

/// Why an existing link cannot be redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkUnavailable {
    #[error("invitation link has expired")]
    Expired,
    #[error("invitation link has reached its usage limit")]
    Exhausted,
    #[error("invitation link is inactive")]
    Inactive,
}

impl LinkUnavailable {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkUnavailable::Expired => "expired",
            LinkUnavailable::Exhausted => "exhausted",
            LinkUnavailable::Inactive => "inactive",
        }
    }

    /// Arabic display message.
    pub fn label(&self) -> &'static str {
        match self {
            LinkUnavailable::Expired => "انتهت صلاحية رابط الدعوة",
            LinkUnavailable::Exhausted => "تم استنفاد عدد مرات استخدام رابط الدعوة",
            LinkUnavailable::Inactive => "رابط الدعوة غير مفعل",
        }
    }
}

/// An invitation link.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitationLink {
    pub id: Uuid,
    pub token: String,
    pub link_type: LinkType,
    /// Inviting entity. For principal links this is the supervisor's user ID.
    pub organization_id: Option<Uuid>,
    pub organization_name: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InvitationLink {
    /// A link stops being redeemable at the instant it expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.used_count >= max)
    }

    /// Checks redeemability. Expiry is reported first, then exhaustion, then
    /// the administrative switch.
    pub fn check_redeemable_at(&self, now: DateTime<Utc>) -> Result<(), LinkUnavailable> {
        if self.is_expired_at(now) {
            return Err(LinkUnavailable::Expired);
        }
        if self.is_exhausted() {
            return Err(LinkUnavailable::Exhausted);
        }
        if !self.is_active {
            return Err(LinkUnavailable::Inactive);
        }
        Ok(())
    }

    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        self.check_redeemable_at(now).is_ok()
    }

    /// Remaining redemptions, `None` when unlimited.
    pub fn remaining_uses(&self) -> Option<i32> {
        self.max_uses.map(|max| (max - self.used_count).max(0))
    }

    pub fn status(&self) -> LinkStatus {
        LinkStatus::from_active(self.is_active)
    }
}

/// API representation of a link.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LinkView {
    pub id: Uuid,
    pub token: String,
    pub link_type: LinkType,
    pub link_type_label: String,
    pub institution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
    pub status: LinkStatus,
    pub used_count: i32,
    pub max_usages: Option<i32>,
    pub remaining_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_redeemable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LinkView {
    pub fn new(link: InvitationLink, now: DateTime<Utc>) -> Self {
        let is_redeemable = link.is_redeemable_at(now);
        let remaining_uses = link.remaining_uses();
        let status = link.status();

        Self {
            id: link.id,
            link_type_label: link.link_type.label().to_string(),
            link_type: link.link_type,
            token: link.token,
            institution: link.organization_name,
            organization_id: link.organization_id,
            status,
            used_count: link.used_count,
            max_usages: link.max_uses,
            remaining_uses,
            expires_at: link.expires_at,
            is_redeemable,
            invite_url: None,
            created_at: link.created_at,
        }
    }

    /// Attaches the public registration URL built from `base_url`.
    pub fn with_invite_url(mut self, base_url: &str) -> Self {
        if !base_url.is_empty() {
            self.invite_url = Some(invite_url(base_url, &self.token));
        }
        self
    }
}

/// Public registration URL for a token.
pub fn invite_url(base_url: &str, token: &str) -> String {
    format!("{}/register/{}", base_url.trim_end_matches('/'), token)
}

/// Request to create a link.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateLinkRequest {
    /// Organization label shown to administrators and registrants.
    #[validate(
        length(max = 255, message = "اسم الجهة يجب ألا يتجاوز 255 حرفاً"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub institution: String,

    /// Optional expiry, must be in the future.
    #[validate(custom(function = "shared::validation::validate_future_timestamp"))]
    pub expiration: Option<DateTime<Utc>>,

    /// Optional usage cap, 1 to [`MAX_USAGES`].
    #[validate(custom(function = "validate_usages"))]
    pub usages: Option<i32>,

    /// Defaults to `supervisor`.
    #[serde(default)]
    pub link_type: LinkType,

    pub organization_id: Option<Uuid>,
}

fn validate_usages(value: i32) -> Result<(), ValidationError> {
    if (1..=MAX_USAGES).contains(&value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("range");
        err.message = Some(
            format!("عدد مرات الاستخدام يجب أن يكون بين 1 و {}", MAX_USAGES).into(),
        );
        err.add_param("max".into(), &MAX_USAGES);
        Err(err)
    }
}

/// Partial update of a link. Absent fields are left unchanged; the token and
/// usage counter cannot be patched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct UpdateLinkRequest {
    #[validate(
        length(max = 255, message = "اسم الجهة يجب ألا يتجاوز 255 حرفاً"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub institution: Option<String>,

    #[validate(custom(function = "shared::validation::validate_future_timestamp"))]
    pub expiration: Option<DateTime<Utc>>,

    #[validate(custom(function = "validate_usages"))]
    pub usages: Option<i32>,

    pub status: Option<LinkStatus>,
}

impl UpdateLinkRequest {
    pub fn is_empty(&self) -> bool {
        self.institution.is_none()
            && self.expiration.is_none()
            && self.usages.is_none()
            && self.status.is_none()
    }
}

/// Validated patch handed to the repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPatch {
    pub organization_name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
    pub is_active: Option<bool>,
}

impl From<UpdateLinkRequest> for LinkPatch {
    fn from(request: UpdateLinkRequest) -> Self {
        Self {
            organization_name: request.institution.map(|s| s.trim().to_string()),
            expires_at: request.expiration,
            max_uses: request.usages,
            is_active: request.status.map(|s| s.is_active()),
        }
    }
}

/// Filters for listing links.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListLinksQuery {
    pub link_type: Option<LinkType>,
    pub status: Option<LinkStatus>,
    /// Case-insensitive substring match on the organization label.
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListLinksQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() as i64 - 1) * self.per_page() as i64
    }

    /// Trimmed, non-empty search term.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Pagination metadata for link listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LinkPagination {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// What an anonymous visitor learns about a token before registering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PublicLinkInfo {
    pub link_type: LinkType,
    pub role: UserRole,
    pub role_label: String,
    pub institution: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<LinkUnavailable>,
}

impl PublicLinkInfo {
    pub fn new(link: &InvitationLink, now: DateTime<Utc>) -> Self {
        let reason = link.check_redeemable_at(now).err();
        let role = link.link_type.granted_role();
        Self {
            link_type: link.link_type,
            role,
            role_label: role.label().to_string(),
            institution: link.organization_name.clone(),
            expires_at: link.expires_at,
            is_valid: reason.is_none(),
            reason,
        }
    }
}
