/// Database connection pool management
///
/// This module provides the SQLite connection pool used by every Bugboard
/// request. Foreign keys are always enforced: the cascading deletes of
/// projects, issues and comment threads rely on them.
///
/// # Example
///
/// ```no_run
/// use bugboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: "sqlite://bugboard.db".to_string(),
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///
///     let row: (i64,) = sqlx::query_as("SELECT ?")
///         .bind(42i64)
///         .fetch_one(&pool)
///         .await?;
///
///     Ok(())
/// }
/// ```

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the database connection pool
///
/// All timeouts are specified in seconds for ease of configuration from environment variables.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection URL (e.g., "sqlite://bugboard.db" or "sqlite::memory:")
    pub url: String,

    /// Maximum number of connections in the pool
    ///
    /// Default: 10
    pub max_connections: u32,

    /// Minimum number of idle connections to maintain
    ///
    /// Default: 1
    pub min_connections: u32,

    /// Timeout for acquiring a connection from the pool (seconds)
    ///
    /// Default: 30 seconds
    pub connect_timeout_seconds: u64,

    /// How long a connection can remain idle before being closed (seconds)
    ///
    /// Default: Some(600) (10 minutes)
    /// None = connections never closed due to idle time
    pub idle_timeout_seconds: Option<u64>,

    /// Maximum lifetime of a connection before forced recycling (seconds)
    ///
    /// Default: Some(1800) (30 minutes)
    pub max_lifetime_seconds: Option<u64>,

    /// Whether to test connections before returning them from the pool
    ///
    /// Default: true
    pub test_before_acquire: bool,

    /// Create the database file when it does not exist yet
    ///
    /// Default: true
    pub create_if_missing: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_seconds: 30,
            idle_timeout_seconds: Some(600),
            max_lifetime_seconds: Some(1800),
            test_before_acquire: true,
            create_if_missing: true,
        }
    }
}

impl DatabaseConfig {
    /// Configuration for a private in-memory database
    ///
    /// An in-memory SQLite database lives exactly as long as its connection,
    /// so the pool is pinned to a single connection that is never recycled.
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            idle_timeout_seconds: None,
            max_lifetime_seconds: None,
            ..Default::default()
        }
    }
}

/// Creates and initializes a SQLite connection pool
///
/// This function:
/// 1. Creates a pool with the specified configuration (foreign keys on)
/// 2. Performs a health check to verify database connectivity
/// 3. Returns an error if the database is unreachable
///
/// # Errors
///
/// Returns an error if:
/// - The database URL is invalid
/// - Cannot open the database
/// - Health check fails
pub async fn create_pool(config: DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        connect_timeout_seconds = config.connect_timeout_seconds,
        "Creating database connection pool"
    );

    let connect_options = SqliteConnectOptions::from_str(&config.url)?
        .foreign_keys(true)
        .create_if_missing(config.create_if_missing);

    let pool_options = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .test_before_acquire(config.test_before_acquire)
        .idle_timeout(config.idle_timeout_seconds.map(Duration::from_secs))
        .max_lifetime(config.max_lifetime_seconds.map(Duration::from_secs));

    if let Some(idle_timeout) = config.idle_timeout_seconds {
        debug!(idle_timeout_seconds = idle_timeout, "Set idle timeout");
    }

    if let Some(max_lifetime) = config.max_lifetime_seconds {
        debug!(max_lifetime_seconds = max_lifetime, "Set max lifetime");
    }

    let pool = pool_options.connect_with(connect_options).await?;

    health_check(&pool).await?;

    info!("Database connection pool created successfully");
    Ok(pool)
}

/// Performs a health check on the database connection
///
/// Executes a simple query to verify the database is reachable and responding.
///
/// # Errors
///
/// Returns an error if the health check query fails
pub async fn health_check(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    debug!("Performing database health check");

    let result: (i32,) = sqlx::query_as("SELECT 1").fetch_one(pool).await?;

    if result.0 == 1 {
        debug!("Database health check passed");
        Ok(())
    } else {
        warn!("Database health check returned unexpected value: {}", result.0);
        Err(sqlx::Error::Protocol(
            "Health check returned unexpected value".into(),
        ))
    }
}

/// Current pool statistics for monitoring
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub active_connections: usize,

    /// Number of idle connections available
    pub idle_connections: usize,

    /// Total connections in the pool
    pub total_connections: usize,
}

/// Gets current pool statistics
pub fn get_pool_stats(pool: &SqlitePool) -> PoolStats {
    let size = pool.size();
    let idle = pool.num_idle();

    PoolStats {
        active_connections: (size as usize).saturating_sub(idle),
        idle_connections: idle,
        total_connections: size as usize,
    }
}

/// Gracefully closes the connection pool
///
/// Call during shutdown so file-backed databases are flushed and unlocked.
pub async fn close_pool(pool: SqlitePool) {
    info!("Closing database connection pool");
    pool.close().await;
    info!("Database connection pool closed");
}
