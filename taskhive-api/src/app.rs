/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with all
/// routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskhive_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```
use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use taskhive_shared::auth::middleware::jwt_auth_middleware;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;
use crate::middleware::rate_limit::{MemoryStore, RateLimitStore};

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; all fields
/// are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Rate limit counter store
    pub rate_limiter: Arc<dyn RateLimitStore>,
}

impl AppState {
    /// Creates application state with the in-memory rate limit store
    pub fn new(db: PgPool, config: Config) -> Self {
        Self::with_rate_limiter(db, config, Arc::new(MemoryStore::new()))
    }

    /// Creates application state with a custom rate limit store
    pub fn with_rate_limiter(
        db: PgPool,
        config: Config,
        rate_limiter: Arc<dyn RateLimitStore>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            rate_limiter,
        }
    }

    /// JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router
///
/// ```text
/// /
/// ├── /health                                # Health check (public)
/// └── /v1/
///     ├── /auth/                             # Public
///     │   ├── POST /register
///     │   ├── POST /login
///     │   └── POST /refresh
///     ├── /projects/                         # Authenticated + rate limited
///     │   ├── GET  /            POST /
///     │   ├── GET  /:id         PUT /:id     DELETE /:id
///     │   ├── POST /:id/archive
///     │   ├── GET  /:id/members
///     │   ├── PUT  /:id/members/:user_id     DELETE /:id/members/:user_id
///     │   ├── POST /:id/members/leave
///     │   ├── POST /:id/transfer-ownership
///     │   └── GET  /:id/invitations          POST /:id/invitations
///     ├── /invitations/:token                # Authenticated
///     │   ├── GET  /
///     │   ├── POST /accept
///     │   └── POST /revoke
///     └── /tasks/                            # Authenticated + rate limited
///         ├── GET  /            POST /
///         ├── GET  /:id         PUT|PATCH /:id  DELETE /:id
///         ├── GET  /:id/comments              POST /:id/comments
///         ├── DELETE /:id/comments/:comment_id
///         ├── GET  /:id/attachments           POST /:id/attachments
///         └── DELETE /:id/attachments/:attachment_id
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/:id/archive", post(routes::projects::archive_project))
        .route("/:id/members", get(routes::members::list_members))
        .route(
            "/:id/members/:user_id",
            put(routes::members::change_role).delete(routes::members::remove_member),
        )
        .route("/:id/members/leave", post(routes::members::leave_project))
        .route(
            "/:id/transfer-ownership",
            post(routes::members::transfer_ownership),
        )
        .route(
            "/:id/invitations",
            get(routes::invitations::list_invitations)
                .post(routes::invitations::create_invitation),
        );

    let invitation_routes = Router::new()
        .route("/:token", get(routes::invitations::get_invitation))
        .route("/:token/accept", post(routes::invitations::accept_invitation))
        .route("/:token/revoke", post(routes::invitations::revoke_invitation));

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/:id/comments",
            get(routes::tasks::list_comments).post(routes::tasks::create_comment),
        )
        .route(
            "/:id/comments/:comment_id",
            delete(routes::tasks::delete_comment),
        )
        .route(
            "/:id/attachments",
            get(routes::tasks::list_attachments).post(routes::tasks::create_attachment),
        )
        .route(
            "/:id/attachments/:attachment_id",
            delete(routes::tasks::delete_attachment),
        );

    // Everything below /v1 except /auth requires a valid access token; the
    // resource routes are additionally rate limited.
    let protected = Router::new()
        .nest("/projects", project_routes)
        .nest("/invitations", invitation_routes)
        .nest("/tasks", task_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::rate_limit::rate_limit_layer,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new().nest("/auth", auth_routes).merge(protected);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Thin adapter over [`jwt_auth_middleware`]: supplies the configured secret
/// and maps auth failures into the API error body.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    jwt_auth_middleware(state.jwt_secret().to_string(), req, next)
        .await
        .map_err(crate::error::ApiError::from)
}
