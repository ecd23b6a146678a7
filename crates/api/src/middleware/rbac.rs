//! Role guards.
//!
//! Each guard loads the caller's role once per request and exposes it to
//! handlers as [`CurrentUser`]. Guards must run after `require_user_auth`.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use domain::models::{UserRole, UserStatus};
use persistence::repositories::UserRepository;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;

pub const FORBIDDEN_MESSAGE: &str = "ليس لديك صلاحية للقيام بهذا الإجراء";

/// Authorized caller with a loaded role.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

/// Checks a loaded role and status against the allowed roles.
pub fn authorize(
    user_id: Uuid,
    role: UserRole,
    status: UserStatus,
    allowed: &[UserRole],
) -> Result<CurrentUser, ApiError> {
    if !status.can_sign_in() {
        return Err(ApiError::Forbidden("الحساب غير مفعل".to_string()));
    }
    if !allowed.contains(&role) {
        return Err(ApiError::Forbidden(FORBIDDEN_MESSAGE.to_string()));
    }
    Ok(CurrentUser { user_id, role })
}

async fn require_role(
    state: AppState,
    mut req: Request<Body>,
    next: Next,
    allowed: &[UserRole],
) -> Result<Response, ApiError> {
    let auth = req
        .extensions()
        .get::<UserAuth>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("يجب تسجيل الدخول أولاً".to_string()))?;

    let (role, status) = UserRepository::new(state.pool.clone())
        .find_role(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("المستخدم غير موجود".to_string()))?;

    let current = authorize(auth.user_id, role, status, allowed).map_err(|e| {
        tracing::warn!(user_id = %auth.user_id, role = %role, "Access denied");
        e
    })?;

    req.extensions_mut().insert(current);
    Ok(next.run(req).await)
}

/// Allows administrators only.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    require_role(state, req, next, &[UserRole::Admin]).await
}

/// Allows supervisors only.
pub async fn require_supervisor(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    require_role(state, req, next, &[UserRole::Supervisor]).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_matching_role() {
        let id = Uuid::new_v4();
        let current = authorize(id, UserRole::Admin, UserStatus::Active, &[UserRole::Admin]).unwrap();
        assert_eq!(current.user_id, id);
        assert_eq!(current.role, UserRole::Admin);
    }

    #[test]
    fn test_authorize_rejects_other_roles() {
        for role in [UserRole::Supervisor, UserRole::SchoolManager, UserRole::Parent] {
            let result = authorize(Uuid::new_v4(), role, UserStatus::Active, &[UserRole::Admin]);
            assert!(matches!(result, Err(ApiError::Forbidden(_))), "{:?}", role);
        }
    }

    #[test]
    fn test_authorize_rejects_inactive_accounts() {
        for status in [UserStatus::Pending, UserStatus::Suspended, UserStatus::Rejected] {
            let result = authorize(Uuid::new_v4(), UserRole::Admin, status, &[UserRole::Admin]);
            assert!(matches!(result, Err(ApiError::Forbidden(_))), "{:?}", status);
        }
    }
}
