//! Link usage entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{LinkUsage, RecentRedemption};
use sqlx::FromRow;
use uuid::Uuid;

use super::invitation_link::LinkTypeDb;

/// Database row mapping for the link_usages table.
#[derive(Debug, Clone, FromRow)]
pub struct LinkUsageEntity {
    pub id: Uuid,
    pub link_id: Uuid,
    pub user_id: Uuid,
    pub used_at: DateTime<Utc>,
}

impl From<LinkUsageEntity> for LinkUsage {
    fn from(entity: LinkUsageEntity) -> Self {
        Self {
            id: entity.id,
            link_id: entity.link_id,
            user_id: entity.user_id,
            used_at: entity.used_at,
        }
    }
}

/// Usage joined with its link and the registering user.
#[derive(Debug, Clone, FromRow)]
pub struct RecentRedemptionEntity {
    pub link_id: Uuid,
    pub link_type: LinkTypeDb,
    pub organization_name: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub used_at: DateTime<Utc>,
}

impl From<RecentRedemptionEntity> for RecentRedemption {
    fn from(entity: RecentRedemptionEntity) -> Self {
        Self {
            link_id: entity.link_id,
            link_type: entity.link_type.into(),
            institution: entity.organization_name,
            user_id: entity.user_id,
            user_name: entity.user_name,
            user_email: entity.user_email,
            used_at: entity.used_at,
        }
    }
}
