/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use gradebook_api::{app::{build_mailer, build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let mailer = build_mailer(&config)?;
/// let app = build_router(AppState::new(pool, config, mailer));
/// # Ok(())
/// # }
/// ```

use crate::{
    config::{Config, MailTransport},
    middleware::auth::{require_login, require_staff},
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use gradebook_shared::mail::{http::HttpMailer, LogMailer, Mailer};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outgoing mail transport
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the mail transport selected by configuration
pub fn build_mailer(config: &Config) -> anyhow::Result<Arc<dyn Mailer>> {
    let mailer: Arc<dyn Mailer> = match &config.mail.transport {
        MailTransport::Log => Arc::new(LogMailer::new(config.mail.from.clone())),
        MailTransport::Http { api_url, api_key } => Arc::new(HttpMailer::new(
            api_url.clone(),
            api_key.clone(),
            config.mail.from.clone(),
        )?),
    };

    Ok(mailer)
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /v1/
///     ├── /auth/                       # Public
///     │   ├── POST /signup
///     │   ├── POST /verify-otp/:user_id
///     │   ├── POST /resend-otp/:user_id
///     │   └── POST /login
///     └── (login required)
///         ├── POST /auth/logout
///         ├── GET  /dashboard
///         ├── GET  /dashboard/admin    # Staff only
///         ├── GET, POST /students
///         ├── GET, PUT, DELETE /students/:id
///         ├── GET, POST /students/:id/progress
///         ├── GET, PUT, DELETE /progress/:id
///         ├── POST /progress/bulk
///         ├── GET, POST /subjects
///         ├── GET, PUT, DELETE /subjects/:id
///         └── GET  /ranking
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per route group)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/verify-otp/:user_id", post(routes::auth::verify_otp))
        .route("/resend-otp/:user_id", post(routes::auth::resend_otp))
        .route("/login", post(routes::auth::login));

    // Everything else requires a live session
    let protected_routes = Router::new()
        .route("/auth/logout", post(routes::auth::logout))
        .route("/dashboard", get(routes::dashboard::home))
        .route(
            "/dashboard/admin",
            get(routes::dashboard::admin_summary)
                .route_layer(axum::middleware::from_fn(require_staff)),
        )
        .route(
            "/students",
            get(routes::students::list_students).post(routes::students::create_student),
        )
        .route(
            "/students/:id",
            get(routes::students::get_student)
                .put(routes::students::update_student)
                .delete(routes::students::delete_student),
        )
        .route(
            "/students/:id/progress",
            get(routes::progress::list_student_progress).post(routes::progress::create_progress),
        )
        .route("/progress/bulk", post(routes::progress::bulk_entry))
        .route(
            "/progress/:id",
            get(routes::progress::get_progress)
                .put(routes::progress::update_progress)
                .delete(routes::progress::delete_progress),
        )
        .route(
            "/subjects",
            get(routes::subjects::list_subjects).post(routes::subjects::create_subject),
        )
        .route(
            "/subjects/:id",
            get(routes::subjects::get_subject)
                .put(routes::subjects::update_subject)
                .delete(routes::subjects::delete_subject),
        )
        .route("/ranking", get(routes::ranking::ranking))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_login,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

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
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
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
