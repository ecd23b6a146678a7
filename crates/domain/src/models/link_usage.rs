//! Link redemption records and aggregate statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::invitation_link::LinkType;

/// One successful redemption of a link.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LinkUsage {
    pub id: Uuid,
    pub link_id: Uuid,
    pub user_id: Uuid,
    pub used_at: DateTime<Utc>,
}

/// A redemption joined with the registering user, for dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecentRedemption {
    pub link_id: Uuid,
    pub link_type: LinkType,
    pub institution: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub used_at: DateTime<Utc>,
}

/// Headline counters over all links.
///
/// `used_links` counts links with at least one redemption, and
/// `expired_links` counts links whose expiry is in the past.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LinkOverview {
    pub total_links: i64,
    pub active_links: i64,
    pub expired_links: i64,
    pub used_links: i64,
    pub exhausted_links: i64,
    pub total_redemptions: i64,
}

/// Link counts per type. Both types are always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinksByType {
    pub supervisor: i64,
    pub principal: i64,
}

impl LinksByType {
    /// Builds the breakdown from grouped rows, ignoring nothing and
    /// defaulting missing types to zero.
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (LinkType, i64)>,
    {
        let mut by_type = Self::default();
        for (link_type, count) in counts {
            match link_type {
                LinkType::Supervisor => by_type.supervisor += count,
                LinkType::Principal => by_type.principal += count,
            }
        }
        by_type
    }

    pub fn total(&self) -> i64 {
        self.supervisor + self.principal
    }
}

/// Dashboard statistics for invitation links.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LinkStatistics {
    pub overview: LinkOverview,
    pub by_type: LinksByType,
    /// Newest first.
    pub recent_redemptions: Vec<RecentRedemption>,
}
