//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod invitation_link;
pub mod link_usage;
pub mod user;

pub use invitation_link::{
    InvitationLinkEntity, LinkOverviewEntity, LinkStateEntity, LinkTypeCountEntity, LinkTypeDb,
};
pub use link_usage::{LinkUsageEntity, RecentRedemptionEntity};
pub use user::{UserEntity, UserRoleEntity, UserStatusDb};
