/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::{build_router, AppState}, config::Config};
/// use taskboard_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.database.pool_config()).await?;
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::OriginalUri,
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskboard_shared::repository::{
    InMemoryStore, PgTaskItemRepository, PgUserRepository, TaskItemRepository, UserRepository,
};
use taskboard_shared::services::{TaskItemService, UserService};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// User business rules
    pub users: UserService,

    /// Task item business rules
    pub task_items: TaskItemService,

    /// Database connection pool; `None` with in-memory storage
    pub db: Option<PgPool>,

    /// Application configuration
    pub config: Arc<Config>,

    /// Root token, cancelled on shutdown
    pub shutdown: CancellationToken,
}

impl AppState {
    /// State backed by PostgreSQL
    pub fn new(db: PgPool, config: Config) -> Self {
        Self::with_repositories(
            Arc::new(PgUserRepository::new(db.clone())),
            Arc::new(PgTaskItemRepository::new(db.clone())),
            Some(db),
            config,
        )
    }

    /// State backed by one shared in-memory store
    pub fn in_memory(store: InMemoryStore, config: Config) -> Self {
        Self::with_repositories(
            Arc::new(store.clone()),
            Arc::new(store),
            None,
            config,
        )
    }

    /// State over arbitrary repository implementations
    pub fn with_repositories(
        users: Arc<dyn UserRepository>,
        task_items: Arc<dyn TaskItemRepository>,
        db: Option<PgPool>,
        config: Config,
    ) -> Self {
        Self {
            users: UserService::new(users),
            task_items: TaskItemService::new(task_items),
            db,
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token for one request; fires when the server shuts down
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                    # Health check
/// └── /api/
///     ├── /users                 # GET list, POST create
///     ├── /users/:id             # GET, PUT, DELETE
///     ├── /taskitems             # GET list, POST create
///     └── /taskitems/:id         # GET, PUT, DELETE
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{health, task_items, users};

    let api_routes = Router::new()
        .route(
            "/users",
            get(users::list_users)
                .post(users::create_user)
                .fallback(method_not_allowed),
        )
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user)
                .fallback(method_not_allowed),
        )
        .route(
            "/taskitems",
            get(task_items::list_task_items)
                .post(task_items::create_task_item)
                .fallback(method_not_allowed),
        )
        .route(
            "/taskitems/:id",
            get(task_items::get_task_item)
                .put(task_items::update_task_item)
                .delete(task_items::delete_task_item)
                .fallback(method_not_allowed),
        );

    Router::new()
        .route(
            "/health",
            get(health::health_check).fallback(method_not_allowed),
        )
        .nest("/api", api_routes)
        .fallback(route_not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

async fn route_not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

async fn method_not_allowed(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::MethodNotAllowed(format!("{} is not supported for {}", method, uri.path()))
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
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
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::LOCATION])
        .max_age(std::time::Duration::from_secs(3600))
}
