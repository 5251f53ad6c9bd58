use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use domain::services::{ConfigLookup, PageDirectory, UserDirectory};
use persistence::repositories::{ConfigRepository, PageRepository, UserRepository};
use shared::jwt::{SessionTokenError, SessionTokens};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin, require_login,
    security_headers_middleware, trace_id, HstsPolicy, RateLimiterState,
};
use crate::routes::{app_settings, customize_setting, health, users};
use crate::services::{MailService, Mailer};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserDirectory>,
    pub pages: Arc<dyn PageDirectory>,
    pub settings: Arc<dyn ConfigLookup>,
    pub mailer: Arc<dyn Mailer>,
    pub tokens: Arc<SessionTokens>,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    /// Wires the directories and mailer to the request-scoped services
    /// derived from `config`.
    pub fn new(
        config: Config,
        users: Arc<dyn UserDirectory>,
        pages: Arc<dyn PageDirectory>,
        settings: Arc<dyn ConfigLookup>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, SessionTokenError> {
        let tokens = SessionTokens::new(
            &config.auth.session_secret,
            config.auth.session_expiry_secs,
            config.auth.leeway_secs,
        )?;
        let rate_limiter = RateLimiterState::new(
            config.security.rate_limit_per_minute,
            config.security.trust_forwarded_for,
        )
        .map(Arc::new);

        Ok(Self {
            users,
            pages,
            settings,
            mailer,
            tokens: Arc::new(tokens),
            config: Arc::new(config),
            rate_limiter,
        })
    }
}

/// Builds the application over PostgreSQL-backed directories.
pub fn create_app(config: Config, pool: PgPool) -> Result<Router, SessionTokenError> {
    let mailer = Arc::new(MailService::new(config.mail.clone()));
    let state = AppState::new(
        config,
        Arc::new(UserRepository::new(pool.clone())),
        Arc::new(PageRepository::new(pool.clone())),
        Arc::new(ConfigRepository::new(pool)),
        mailer,
    )?;

    Ok(build_router(state))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| o.parse().ok()))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    // Guards run before rate limiting so logged-in callers are limited per user.
    let admin_routes = Router::new()
        .route("/_api/v3/users", get(users::list_users))
        .route("/_api/v3/users/invite", post(users::invite))
        .route("/_api/v3/users/reset-password", put(users::reset_password))
        .route("/_api/v3/users/:id/giveAdmin", put(users::give_admin))
        .route("/_api/v3/users/:id/removeAdmin", put(users::remove_admin))
        .route("/_api/v3/users/:id/activate", put(users::activate))
        .route("/_api/v3/users/:id/deactivate", put(users::deactivate))
        .route("/_api/v3/users/:id/remove", delete(users::remove))
        .route(
            "/_api/v3/customize-setting/function",
            get(customize_setting::get_function_settings)
                .put(customize_setting::update_function_settings),
        )
        .route(
            "/_api/v3/app-settings/site-url",
            get(app_settings::get_site_url),
        )
        .route(
            "/_api/v3/app-settings/site-url-setting",
            put(app_settings::update_site_url),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let login_routes = Router::new()
        .route(
            "/_api/v3/users/:id/recent",
            get(users::recent_created_pages),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    let public_routes = Router::new()
        .route("/_api/v3/users/exists", get(users::exists))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    let ops_routes = Router::new()
        .route("/_api/v3/healthcheck", get(health::healthcheck))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(admin_routes)
        .merge(login_routes)
        .merge(public_routes)
        .merge(ops_routes)
        .layer(middleware::from_fn_with_state(
            HstsPolicy(config.security.hsts_enabled),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.security.cors_origins))
        .with_state(state)
}
