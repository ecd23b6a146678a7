//! HTTP route handlers.

pub mod health;
pub mod invitation_links;
pub mod invitations;
pub mod principal_links;
