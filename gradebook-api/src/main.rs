//! # Gradebook API Server
//!
//! JSON API for student records and grading: signup with email OTP,
//! students, subjects, progress sheets, bulk marks entry and rankings.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/gradebook JWT_SECRET=... cargo run -p gradebook-api
//! ```

use gradebook_api::{
    app::{build_mailer, build_router, AppState},
    config::{AdminConfig, Config},
};
use gradebook_shared::{
    auth::password::hash_password,
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    models::user::{CreateUser, User},
};
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gradebook_api=debug,gradebook_shared=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Gradebook API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(DatabaseConfig {
        max_connections: config.database.max_connections,
        ..DatabaseConfig::with_url(config.database.url.clone())
    })
    .await?;

    run_migrations(&pool).await?;

    if let Some(admin) = &config.admin {
        bootstrap_admin(&pool, admin).await?;
    }

    let mailer = build_mailer(&config)?;
    let bind_address = config.bind_address();

    let app = build_router(AppState::new(pool.clone(), config, mailer));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

/// Creates the configured staff account unless its email is already registered
async fn bootstrap_admin(pool: &PgPool, admin: &AdminConfig) -> anyhow::Result<()> {
    let password_hash = hash_password(&admin.password)?;

    let created = User::create_if_absent(
        pool,
        CreateUser {
            email: admin.email.clone(),
            username: admin.username.clone(),
            password_hash,
            is_verified: true,
            is_staff: true,
        },
    )
    .await?;

    match created {
        Some(user) => tracing::info!(user_id = %user.id, "Staff account created"),
        None => tracing::debug!(email = %admin.email, "Staff account already exists"),
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
