//! Repository implementations for database operations.

pub mod invitation_link;
pub mod user;

pub use invitation_link::{InvitationLinkRepository, NewInvitationLink};
pub use user::{NewUser, UserRepository};
