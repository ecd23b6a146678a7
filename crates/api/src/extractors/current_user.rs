//! Extractor for the caller authorized by a role guard.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;
use crate::middleware::rbac::CurrentUser;

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or_else(|| ApiError::Unauthorized("يجب تسجيل الدخول أولاً".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use domain::models::UserRole;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_extracts_from_extensions() {
        let user_id = Uuid::new_v4();
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts.extensions.insert(CurrentUser {
            user_id,
            role: UserRole::Admin,
        });

        let current = CurrentUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(current.user_id, user_id);
    }

    #[tokio::test]
    async fn test_missing_guard_is_unauthorized() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let result = CurrentUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }
}
