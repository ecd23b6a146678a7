//! Supervisor-issued principal registration links.
//!
//! A supervisor invites school principals with links scoped to themselves:
//! the link's `organization_id` is the supervisor's user ID, and principals
//! registering through it record the supervisor as their inviter.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use domain::models::{CreateLinkRequest, LinkPagination, LinkType, LinkView, ListLinksQuery};
use persistence::repositories::InvitationLinkRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::middleware::CurrentUser;
use crate::response::ApiResponse;
use crate::routes::invitation_links::{insert_link, to_view};

/// POST /api/v1/supervisor/principal-links
pub async fn create_principal_link(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidatedJson(mut request): ValidatedJson<CreateLinkRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LinkView>>), ApiError> {
    request.link_type = LinkType::Principal;
    let link = insert_link(&state, request, Some(current.user_id), current.user_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(to_view(&state, link), "تم إنشاء الرابط بنجاح")),
    ))
}

/// GET /api/v1/supervisor/principal-links
pub async fn list_principal_links(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(mut query): Query<ListLinksQuery>,
) -> Result<Json<ApiResponse<Vec<LinkView>>>, ApiError> {
    query.link_type = Some(LinkType::Principal);

    let repo = InvitationLinkRepository::new(state.pool.clone());
    let (links, total) = repo.list(&query, Some(current.user_id)).await?;

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
