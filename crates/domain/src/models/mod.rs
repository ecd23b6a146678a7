//! Domain models for school rating onboarding.

pub mod invitation_link;
pub mod link_usage;
pub mod registration;
pub mod user;

pub use invitation_link::{
    CreateLinkRequest, InvitationLink, LinkPagination, LinkPatch, LinkStatus, LinkType,
    LinkUnavailable, LinkView, ListLinksQuery, PublicLinkInfo, UpdateLinkRequest,
};
pub use link_usage::{LinkOverview, LinkStatistics, LinkUsage, LinksByType, RecentRedemption};
pub use registration::{NewRegistration, RedeemLinkRequest, RegistrationContext};
pub use user::{User, UserRole, UserStatus};
