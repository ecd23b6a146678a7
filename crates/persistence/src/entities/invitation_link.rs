//! Invitation link entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{InvitationLink, LinkType};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for invitation_link_type that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "invitation_link_type", rename_all = "lowercase")]
pub enum LinkTypeDb {
    Supervisor,
    Principal,
}

impl From<LinkTypeDb> for LinkType {
    fn from(db_type: LinkTypeDb) -> Self {
        match db_type {
            LinkTypeDb::Supervisor => LinkType::Supervisor,
            LinkTypeDb::Principal => LinkType::Principal,
        }
    }
}

impl From<LinkType> for LinkTypeDb {
    fn from(link_type: LinkType) -> Self {
        match link_type {
            LinkType::Supervisor => LinkTypeDb::Supervisor,
            LinkType::Principal => LinkTypeDb::Principal,
        }
    }
}

/// Database row mapping for the invitation_links table.
#[derive(Debug, Clone, FromRow)]
pub struct InvitationLinkEntity {
    pub id: Uuid,
    pub token: String,
    pub link_type: LinkTypeDb,
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

impl From<InvitationLinkEntity> for InvitationLink {
    fn from(entity: InvitationLinkEntity) -> Self {
        Self {
            id: entity.id,
            token: entity.token,
            link_type: entity.link_type.into(),
            organization_id: entity.organization_id,
            organization_name: entity.organization_name,
            is_active: entity.is_active,
            expires_at: entity.expires_at,
            max_uses: entity.max_uses,
            used_count: entity.used_count,
            created_by: entity.created_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// A link row read together with the database clock, used to classify
/// failed redemptions against the same time source the claim used.
#[derive(Debug, Clone, FromRow)]
pub struct LinkStateEntity {
    #[sqlx(flatten)]
    pub link: InvitationLinkEntity,
    pub checked_at: DateTime<Utc>,
}

/// Row of the per-type link count query.
#[derive(Debug, Clone, FromRow)]
pub struct LinkTypeCountEntity {
    pub link_type: LinkTypeDb,
    pub count: i64,
}

/// Row of the overview counters query.
#[derive(Debug, Clone, FromRow)]
pub struct LinkOverviewEntity {
    pub total_links: i64,
    pub active_links: i64,
    pub expired_links: i64,
    pub used_links: i64,
    pub exhausted_links: i64,
    pub total_redemptions: i64,
}

impl From<LinkOverviewEntity> for domain::models::LinkOverview {
    fn from(entity: LinkOverviewEntity) -> Self {
        Self {
            total_links: entity.total_links,
            active_links: entity.active_links,
            expired_links: entity.expired_links,
            used_links: entity.used_links,
            exhausted_links: entity.exhausted_links,
            total_redemptions: entity.total_redemptions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_type_db_conversions() {
        assert_eq!(LinkType::from(LinkTypeDb::Principal), LinkType::Principal);
        assert_eq!(LinkTypeDb::from(LinkType::Supervisor), LinkTypeDb::Supervisor);
    }

    #[test]
    fn test_invitation_link_entity_to_domain() {
        let now = Utc::now();
        let entity = InvitationLinkEntity {
            id: Uuid::new_v4(),
            token: "inv_abc123".to_string(),
            link_type: LinkTypeDb::Principal,
            organization_id: Some(Uuid::new_v4()),
            organization_name: "مدرسة النور".to_string(),
            is_active: true,
            expires_at: None,
            max_uses: Some(5),
            used_count: 2,
            created_by: None,
            created_at: now,
            updated_at: now,
        };

        let link: InvitationLink = entity.clone().into();
        assert_eq!(link.id, entity.id);
        assert_eq!(link.link_type, LinkType::Principal);
        assert_eq!(link.organization_id, entity.organization_id);
        assert_eq!(link.remaining_uses(), Some(3));
    }
}
