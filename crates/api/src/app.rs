use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin,
    require_supervisor, require_user_auth, security_headers_middleware, trace_id,
    RateLimiterState,
};
use crate::routes::{health, invitation_links, invitations, principal_links};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    /// Builds shared state. Fails when the configured JWT keys are invalid.
    pub fn new(config: Config, pool: PgPool) -> Result<Self, JwtError> {
        let jwt = JwtConfig::from_rsa_pem(
            &config.jwt.private_key,
            &config.jwt.public_key,
            config.jwt.access_token_expiry_secs,
            config.jwt.leeway_secs,
        )?;

        let rate_limiter = RateLimiterState::new(
            config.security.rate_limit_per_minute,
            config.security.trusted_proxy_addrs(),
        )
        .map(Arc::new);

        Ok(Self {
            pool,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            rate_limiter,
        })
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Result<Router, JwtError> {
    Ok(build_router(AppState::new(config, pool)?))
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Admin link management. Auth runs first (outermost route layer), then
    // the role guard.
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/supervisor-links",
            post(invitation_links::create_link).get(invitation_links::list_links),
        )
        .route(
            "/api/v1/admin/supervisor-links/statistics",
            get(invitation_links::get_statistics),
        )
        .route(
            "/api/v1/admin/supervisor-links/:id",
            get(invitation_links::get_link)
                .put(invitation_links::update_link)
                .delete(invitation_links::delete_link),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    let supervisor_routes = Router::new()
        .route(
            "/api/v1/supervisor/principal-links",
            post(principal_links::create_principal_link)
                .get(principal_links::list_principal_links),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_supervisor,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Public invitation endpoints, throttled per client.
    let invitation_routes = Router::new()
        .route(
            "/api/v1/invitations/:token",
            get(invitations::preview_invitation),
        )
        .route(
            "/api/v1/invitations/:token/redeem",
            post(invitations::redeem_invitation),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(invitation_routes)
        .merge(admin_routes)
        .merge(supervisor_routes)
        // Global middleware (bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(config.server.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
