/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use bugboard_api::{app::AppState, config::Config};
/// use bugboard_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.database.pool_config()).await?;
/// let state = AppState::new(pool, config);
/// let app = bugboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use bugboard_shared::auth::middleware::{create_jwt_middleware, create_optional_jwt_middleware};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: SqlitePool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Entries per list page
    pub fn per_page(&self) -> i64 {
        self.config.listing.per_page
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check
/// └── /v1/
///     ├── /auth/                       # register, login, refresh
///     ├── GET  /home
///     ├── GET  /search?q=
///     ├── GET  /users/:name
///     ├── /projects/
///     │   ├── GET  /  POST /           # list, create
///     │   ├── GET  /filter/:term
///     │   ├── GET  /:id                # detail with scoped issue list
///     │   ├── GET  /:id/filter/:term
///     │   ├── POST /:id/update | /:id/delete
///     │   ├── POST /:id/members/add | /:id/members/remove
///     │   └── POST /:id/issues         # create issue
///     ├── /issues/
///     │   ├── GET  /  GET /filter/:term
///     │   ├── GET  /:id                # detail with comment threads
///     │   ├── POST /:id/update | /delete | /open | /close
///     │   ├── POST /:id/members/add | /:id/members/remove
///     │   └── POST /:id/comments
///     └── /comments/
///         └── POST /:id/edit | /:id/delete
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Optional JWT authentication on `/v1`, required on `/v1/comments`;
///    other mutating handlers require it through the `AuthContext` extractor
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (tower-http CorsLayer)
/// 4. Security headers
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
        .route("/filter/:term", get(routes::projects::list_projects_by_term))
        .route("/:id", get(routes::projects::project_detail))
        .route("/:id/filter/:term", get(routes::projects::project_detail_by_term))
        .route("/:id/update", post(routes::projects::update_project))
        .route("/:id/delete", post(routes::projects::delete_project))
        .route("/:id/members/add", post(routes::projects::add_member))
        .route("/:id/members/remove", post(routes::projects::remove_member))
        .route("/:id/issues", post(routes::issues::create_issue));

    let issue_routes = Router::new()
        .route("/", get(routes::issues::list_issues))
        .route("/filter/:term", get(routes::issues::list_issues_by_term))
        .route("/:id", get(routes::issues::issue_detail))
        .route("/:id/update", post(routes::issues::update_issue))
        .route("/:id/delete", post(routes::issues::delete_issue))
        .route("/:id/open", post(routes::issues::open_issue))
        .route("/:id/close", post(routes::issues::close_issue))
        .route("/:id/members/add", post(routes::issues::add_member))
        .route("/:id/members/remove", post(routes::issues::remove_member))
        .route("/:id/comments", post(routes::comments::add_comment));

    // Comment routes only mutate, so the whole group requires a token
    let comment_routes = Router::new()
        .route("/:id/edit", post(routes::comments::edit_comment))
        .route("/:id/delete", post(routes::comments::delete_comment))
        .layer(axum::middleware::from_fn(create_jwt_middleware(
            state.jwt_secret().to_string(),
        )));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .route("/home", get(routes::home::home))
        .route("/search", get(routes::search::search))
        .route("/users/:name", get(routes::users::user_profile))
        .nest("/projects", project_routes)
        .nest("/issues", issue_routes)
        .nest("/comments", comment_routes)
        .layer(axum::middleware::from_fn(create_optional_jwt_middleware(
            state.jwt_secret().to_string(),
        )));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
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
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
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
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
