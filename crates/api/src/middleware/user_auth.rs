//! Bearer JWT authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use shared::jwt::{extract_user_id, JwtConfig, JwtError};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated caller, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct UserAuth {
    /// User ID from the JWT subject claim.
    pub user_id: Uuid,
    /// JWT ID (jti) of the presented token.
    pub jti: String,
}

impl UserAuth {
    /// Validates an access token and returns the caller.
    pub fn validate(jwt_config: &JwtConfig, token: &str) -> Result<Self, JwtError> {
        let claims = jwt_config.validate_access_token(token)?;
        Ok(UserAuth {
            user_id: extract_user_id(&claims)?,
            jti: claims.jti,
        })
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Rejects requests without a valid access token.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("يجب تسجيل الدخول أولاً".to_string()))?;

    let auth = UserAuth::validate(&state.jwt, token).map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        ApiError::Unauthorized("رمز الدخول غير صالح أو منتهي الصلاحية".to_string())
    })?;

    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}
