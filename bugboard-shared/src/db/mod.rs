/// Database layer for Bugboard
///
/// This module provides database connection pooling and migrations.
///
/// # Modules
///
/// - `pool`: SQLite connection pool management with health checks
/// - `migrations`: Embedded migration runner
/// - Models are in the `models` module at crate root level
///
/// # Example
///
/// ```no_run
/// use bugboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("BUGBOARD_DATABASE__URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;

/// Opens a fresh in-memory database with every migration applied
///
/// Used by tests across the workspace.
pub async fn memory_pool() -> Result<sqlx::SqlitePool, sqlx::Error> {
    let pool = pool::create_pool(pool::DatabaseConfig::in_memory()).await?;
    migrations::run_migrations(&pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;
    Ok(pool)
}
