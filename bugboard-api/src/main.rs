//! # Bugboard API Server
//!
//! JSON API for the Bugboard issue tracker: projects, issues, threaded
//! comments, assignments and search.
//!
//! ## Usage
//!
//! ```bash
//! BUGBOARD_JWT__SECRET=$(openssl rand -hex 32) cargo run -p bugboard-api
//! ```

use bugboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use bugboard_shared::db::{
    migrations::{ensure_database_exists, get_migration_status, run_migrations},
    pool::{close_pool, create_pool, get_pool_stats},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bugboard_api=debug,bugboard_shared=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Bugboard API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    ensure_database_exists(&config.database.url).await?;
    let pool = create_pool(config.database.pool_config()).await?;
    run_migrations(&pool).await?;

    let status = get_migration_status(&pool).await?;
    tracing::info!(
        applied = status.applied_migrations,
        up_to_date = status.is_up_to_date,
        latest = ?status.latest_version,
        "Database ready"
    );

    let address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config));

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received, exiting...");
        })
        .await?;

    let stats = get_pool_stats(&pool);
    tracing::debug!(total = stats.total_connections, idle = stats.idle_connections, "Closing database pool");
    close_pool(pool).await;

    Ok(())
}
