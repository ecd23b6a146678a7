//! Domain error types.

use thiserror::Error;

use crate::models::LinkUnavailable;

/// Failures of invitation link operations.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("invitation link not found")]
    NotFound,

    #[error(transparent)]
    Unavailable(#[from] LinkUnavailable),

    #[error("email address is already registered")]
    EmailTaken,

    #[error("usage cap {requested} is below the current usage count {used}")]
    InvalidUsageCap { used: i32, requested: i32 },

    #[error("could not generate a unique link token")]
    TokenGeneration,
}

impl LinkError {
    /// Machine-readable code of the failure.
    pub fn code(&self) -> &'static str {
        match self {
            LinkError::NotFound => "not_found",
            LinkError::Unavailable(LinkUnavailable::Expired) => "link_expired",
            LinkError::Unavailable(LinkUnavailable::Exhausted) => "link_exhausted",
            LinkError::Unavailable(LinkUnavailable::Inactive) => "link_inactive",
            LinkError::EmailTaken => "email_taken",
            LinkError::InvalidUsageCap { .. } => "validation_error",
            LinkError::TokenGeneration => "internal_error",
        }
    }
}
