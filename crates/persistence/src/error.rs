//! Repository error type.

use domain::LinkError;
use thiserror::Error;

/// Errors returned by repository operations that enforce link rules.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Link(#[from] LinkError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<domain::models::LinkUnavailable> for RepositoryError {
    fn from(reason: domain::models::LinkUnavailable) -> Self {
        RepositoryError::Link(LinkError::Unavailable(reason))
    }
}

/// True when the error is a unique constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::LinkUnavailable;

    #[test]
    fn test_unavailable_converts_to_link_error() {
        let err = RepositoryError::from(LinkUnavailable::Exhausted);
        assert!(matches!(
            err,
            RepositoryError::Link(LinkError::Unavailable(LinkUnavailable::Exhausted))
        ));
    }

    #[test]
    fn test_row_not_found_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
