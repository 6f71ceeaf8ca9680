/// Configuration management for the API server
///
/// Configuration is layered: built-in defaults first, then environment
/// variables prefixed with `BUGBOARD_`. Nested keys use a double underscore,
/// so `database.url` is read from `BUGBOARD_DATABASE__URL`. A `.env` file in
/// the working directory is loaded first when present.
///
/// # Environment Variables
///
/// - `BUGBOARD_DATABASE__URL`: SQLite connection string (default: sqlite://bugboard.db)
/// - `BUGBOARD_API__HOST`: Host to bind to (default: 0.0.0.0)
/// - `BUGBOARD_API__PORT`: Port to bind to (default: 8080)
/// - `BUGBOARD_API__CORS_ORIGINS`: Comma separated allowed origins (default: *)
/// - `BUGBOARD_API__PRODUCTION`: Enables HSTS (default: false)
/// - `BUGBOARD_JWT__SECRET`: Secret key for JWT signing (required)
/// - `BUGBOARD_LISTING__PER_PAGE`: Entries per list page (default: 10)
/// - `RUST_LOG`: Log level (default: info)
///
/// # Example
///
/// ```no_run
/// use bugboard_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use bugboard_shared::db::pool::DatabaseConfig;
use bugboard_shared::listing::DEFAULT_PAGE_SIZE;
use config::Environment;
use serde::{Deserialize, Serialize};

/// Minimum JWT secret length
pub const MIN_SECRET_CHARS: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseSettings,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// List view configuration
    pub listing: ListingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode turns on HSTS
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Seconds to wait for a free connection
    pub connect_timeout_seconds: u64,
}

impl DatabaseSettings {
    /// Pool configuration for these settings
    pub fn pool_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            connect_timeout_seconds: self.connect_timeout_seconds,
            ..Default::default()
        }
    }
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Entries per list page
    pub per_page: i64,
}

impl Config {
    /// Loads configuration from defaults, `.env` and the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The JWT secret is missing or shorter than 32 characters
    /// - A variable has a value of the wrong type
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::load(Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix("BUGBOARD")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("api.cors_origins")
            .try_parsing(true)
    }

    /// Builds configuration from defaults overlaid with the given source
    pub fn load(environment: Environment) -> anyhow::Result<Self> {
        let config: Config = config::Config::builder()
            .set_default("api.host", "0.0.0.0")?
            .set_default("api.port", 8080)?
            .set_default("api.cors_origins", vec!["*"])?
            .set_default("api.production", false)?
            .set_default("database.url", "sqlite://bugboard.db")?
            .set_default("database.max_connections", 10)?
            .set_default("database.connect_timeout_seconds", 30)?
            .set_default("jwt.secret", "")?
            .set_default("listing.per_page", DEFAULT_PAGE_SIZE)?
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.jwt.secret.is_empty() {
            anyhow::bail!("BUGBOARD_JWT__SECRET environment variable is required");
        }

        if self.jwt.secret.chars().count() < MIN_SECRET_CHARS {
            anyhow::bail!("JWT secret must be at least {} characters long", MIN_SECRET_CHARS);
        }

        if self.listing.per_page < 1 {
            anyhow::bail!("listing.per_page must be positive");
        }

        Ok(())
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
