//! Admin management of invitation links.
//!
//! All handlers sit behind `require_user_auth` and `require_admin`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::{
    CreateLinkRequest, InvitationLink, LinkPagination, LinkPatch, LinkStatistics, LinkView,
    ListLinksQuery, UpdateLinkRequest, UserRole,
};
use persistence::repositories::{InvitationLinkRepository, NewInvitationLink, UserRepository};
use shared::crypto::token_fingerprint;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::{ApiError, ValidationDetail};
use crate::extractors::ValidatedJson;
use crate::middleware::metrics::record_link_created;
use crate::middleware::CurrentUser;
use crate::response::ApiResponse;

pub(crate) const LINK_NOT_FOUND: &str = "الرابط غير موجود";

/// Response shape of a link, with its public registration URL.
pub(crate) fn to_view(state: &AppState, link: InvitationLink) -> LinkView {
    LinkView::new(link, Utc::now()).with_invite_url(&state.config.invitations.base_url)
}

/// Requires `organization_id` to name an existing supervisor account.
async fn check_organization(state: &AppState, organization_id: Uuid) -> Result<(), ApiError> {
    let users = UserRepository::new(state.pool.clone());
    match users.find_role(organization_id).await? {
        Some((UserRole::Supervisor, _)) => Ok(()),
        _ => Err(ApiError::Validation {
            message: "الجهة المحددة ليست مشرفاً مسجلاً".to_string(),
            details: Some(vec![ValidationDetail {
                field: "organization_id".to_string(),
                message: "يجب أن يشير إلى حساب مشرف موجود".to_string(),
            }]),
        }),
    }
}

/// Generates a unique token and stores a new link.
pub(crate) async fn insert_link(
    state: &AppState,
    request: CreateLinkRequest,
    organization_id: Option<Uuid>,
    created_by: Uuid,
) -> Result<InvitationLink, ApiError> {
    let repo = InvitationLinkRepository::new(state.pool.clone());
    let token = repo
        .generate_unique_token(state.config.invitations.token_generation_attempts)
        .await?;

    let link = repo
        .create(NewInvitationLink {
            token,
            link_type: request.link_type,
            organization_id,
            organization_name: request.institution.trim().to_string(),
            expires_at: request.expiration,
            max_uses: request.usages,
            created_by: Some(created_by),
        })
        .await?;

    record_link_created(link.link_type.as_str());
    tracing::info!(
        link_id = %link.id,
        link_type = %link.link_type,
        created_by = %created_by,
        token_fingerprint = %token_fingerprint(&link.token),
        "Invitation link created"
    );

    Ok(link)
}

/// POST /api/v1/admin/supervisor-links
pub async fn create_link(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateLinkRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LinkView>>), ApiError> {
    let organization_id = request.organization_id;
    if let Some(organization_id) = organization_id {
        check_organization(&state, organization_id).await?;
    }
    let link = insert_link(&state, request, organization_id, current.user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(to_view(&state, link), "تم إنشاء الرابط بنجاح")),
    ))
}

/// GET /api/v1/admin/supervisor-links
pub async fn list_links(
    State(state): State<AppState>,
    Query(query): Query<ListLinksQuery>,
) -> Result<Json<ApiResponse<Vec<LinkView>>>, ApiError> {
    let repo = InvitationLinkRepository::new(state.pool.clone());
    let (links, total) = repo.list(&query, None).await?;

    let views = links.into_iter().map(|link| to_view(&state, link)).collect();
    let pagination = LinkPagination {
        page: query.page(),
        per_page: query.per_page(),
        total,
    };

    Ok(Json(ApiResponse::paginated(
        views,
        pagination,
        "تم جلب الروابط بنجاح",
    )))
}

/// GET /api/v1/admin/supervisor-links/statistics
pub async fn get_statistics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<LinkStatistics>>, ApiError> {
    let repo = InvitationLinkRepository::new(state.pool.clone());
    let statistics = repo
        .statistics(state.config.invitations.recent_redemptions_limit)
        .await?;

    Ok(Json(ApiResponse::ok(statistics, "تم جلب الإحصائيات بنجاح")))
}

/// GET /api/v1/admin/supervisor-links/:id
pub async fn get_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LinkView>>, ApiError> {
    let repo = InvitationLinkRepository::new(state.pool.clone());
    let link = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(LINK_NOT_FOUND.to_string()))?;

    Ok(Json(ApiResponse::ok(to_view(&state, link), "تم جلب الرابط بنجاح")))
}

/// PUT /api/v1/admin/supervisor-links/:id
pub async fn update_link(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateLinkRequest>,
) -> Result<Json<ApiResponse<LinkView>>, ApiError> {
    if request.is_empty() {
        return Err(ApiError::validation("لا توجد بيانات للتحديث"));
    }

    let repo = InvitationLinkRepository::new(state.pool.clone());
    let patch = LinkPatch::from(request);
    let link = repo.update(id, &patch).await?;

    tracing::info!(
        link_id = %link.id,
        admin_id = %current.user_id,
        is_active = link.is_active,
        "Invitation link updated"
    );

    Ok(Json(ApiResponse::ok(to_view(&state, link), "تم تحديث الرابط بنجاح")))
}

/// DELETE /api/v1/admin/supervisor-links/:id
pub async fn delete_link(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let repo = InvitationLinkRepository::new(state.pool.clone());
    if !repo.delete(id).await? {
        return Err(ApiError::NotFound(LINK_NOT_FOUND.to_string()));
    }

    tracing::info!(link_id = %id, admin_id = %current.user_id, "Invitation link deleted");

    Ok(Json(ApiResponse::message("تم حذف الرابط بنجاح")))
}
