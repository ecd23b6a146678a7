//! Public invitation endpoints. The token in the path is the credential.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::{NewRegistration, PublicLinkInfo, RedeemLinkRequest, RegistrationContext};
use persistence::repositories::InvitationLinkRepository;
use shared::crypto::{looks_like_link_token, token_fingerprint};
use shared::password::hash_password;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::middleware::metrics::record_redemption;
use crate::response::ApiResponse;
use crate::routes::invitation_links::LINK_NOT_FOUND;

/// GET /api/v1/invitations/:token
///
/// Unknown tokens are 404. Known but unusable links are still described,
/// with `is_valid = false` and the reason.
pub async fn preview_invitation(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<PublicLinkInfo>>, ApiError> {
    if !looks_like_link_token(&token) {
        return Err(ApiError::NotFound(LINK_NOT_FOUND.to_string()));
    }

    let repo = InvitationLinkRepository::new(state.pool.clone());
    let link = repo
        .find_by_token(&token)
        .await?
        .ok_or_else(|| ApiError::NotFound(LINK_NOT_FOUND.to_string()))?;

    Ok(Json(ApiResponse::ok(
        PublicLinkInfo::new(&link, Utc::now()),
        "تم جلب بيانات الدعوة بنجاح",
    )))
}

/// POST /api/v1/invitations/:token/redeem
///
/// Creates a pending account with the role granted by the link.
pub async fn redeem_invitation(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ValidatedJson(request): ValidatedJson<RedeemLinkRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegistrationContext>>), ApiError> {
    let fingerprint = token_fingerprint(&token);

    let result = redeem(&state, &token, request).await;
    match &result {
        Ok(context) => {
            record_redemption("success");
            tracing::info!(
                link_id = %context.link_id,
                user_id = %context.user_id,
                role = %context.role,
                token_fingerprint = %fingerprint,
                "Invitation link redeemed"
            );
        }
        Err(e) => {
            record_redemption(e.code());
            tracing::info!(
                outcome = e.code(),
                token_fingerprint = %fingerprint,
                "Invitation link redemption rejected"
            );
        }
    }

    let context = result?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            context,
            "تم التسجيل بنجاح، حسابك بانتظار موافقة الإدارة",
        )),
    ))
}

async fn redeem(
    state: &AppState,
    token: &str,
    request: RedeemLinkRequest,
) -> Result<RegistrationContext, ApiError> {
    if !looks_like_link_token(token) {
        return Err(ApiError::NotFound(LINK_NOT_FOUND.to_string()));
    }

    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;

    let registrant = NewRegistration {
        name: request.name.trim().to_string(),
        email: request.normalized_email(),
        password_hash,
        phone: request
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string),
    };

    let repo = InvitationLinkRepository::new(state.pool.clone());
    Ok(repo.redeem(token, &registrant).await?)
}
