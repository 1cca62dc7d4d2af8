/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any
///   (default: http://localhost:3000,http://localhost:5173)
/// - `TASKBOARD_STORAGE`: `postgres` or `memory` (default: postgres)
/// - `DATABASE_URL`: PostgreSQL connection string (required for postgres)
/// - `DATABASE_MAX_CONNECTIONS`: Pool upper bound (default: 10)
/// - `DATABASE_MIN_CONNECTIONS`: Pool lower bound (default: 2)
/// - `DATABASE_CONNECT_TIMEOUT`: Seconds to wait for a connection (default: 30)
/// - `RUN_MIGRATIONS`: Apply embedded migrations at startup (default: true)
/// - `RUST_LOG`: Log filter
/// - `LOG_FORMAT`: `json` for JSON log lines
///
/// # Example
///
/// ```no_run
/// use taskboard_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use taskboard_shared::db::pool;

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Which repository backend serves requests
    pub storage: StorageBackend,

    /// Apply embedded migrations before serving
    pub run_migrations: bool,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any origin
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL (empty with in-memory storage)
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,

    /// Minimum number of idle connections kept open
    pub min_connections: u32,

    /// Seconds to wait when acquiring a connection
    pub connect_timeout_seconds: u64,
}

impl DatabaseConfig {
    /// Pool settings for [`pool::create_pool`]
    pub fn pool_config(&self) -> pool::DatabaseConfig {
        pool::DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_seconds: self.connect_timeout_seconds,
            ..Default::default()
        }
    }
}

/// Repository backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Postgres => f.write_str("postgres"),
            StorageBackend::Memory => f.write_str("memory"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("unknown storage backend '{}' (expected postgres or memory)", other),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` is missing while storage is `postgres`
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "API_PORT", 8080u16)?;

        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let storage = parse_or(&lookup, "TASKBOARD_STORAGE", StorageBackend::Postgres)?;

        let url = match (lookup("DATABASE_URL"), storage) {
            (Some(url), _) => url,
            (None, StorageBackend::Memory) => String::new(),
            (None, StorageBackend::Postgres) => {
                anyhow::bail!("DATABASE_URL environment variable is required")
            }
        };

        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        let min_connections = parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", 2u32)?;
        if min_connections > max_connections {
            anyhow::bail!(
                "DATABASE_MIN_CONNECTIONS ({}) exceeds DATABASE_MAX_CONNECTIONS ({})",
                min_connections,
                max_connections
            );
        }
        let connect_timeout_seconds = parse_or(&lookup, "DATABASE_CONNECT_TIMEOUT", 30u64)?;

        let run_migrations = parse_or(&lookup, "RUN_MIGRATIONS", true)?;

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            database: DatabaseConfig {
                url,
                max_connections,
                min_connections,
                connect_timeout_seconds,
            },
            storage,
            run_migrations,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether any origin may call the API
    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgresql://localhost/taskboard")]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(
            config.api.cors_origins,
            vec!["http://localhost:3000", "http://localhost:5173"]
        );
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.min_connections, 2);
        assert_eq!(config.database.connect_timeout_seconds, 30);
        assert!(config.run_migrations);
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn test_database_url_required_for_postgres() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_memory_storage_needs_no_database() {
        let config = load(&[("TASKBOARD_STORAGE", "Memory"), ("CORS_ORIGINS", "*")]).unwrap();

        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.database.url.is_empty());
        assert!(config.allows_any_origin());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = load(&[("TASKBOARD_STORAGE", "memory"), ("API_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("API_PORT"));

        let err = load(&[("TASKBOARD_STORAGE", "redis")]).unwrap_err();
        assert!(err.to_string().contains("TASKBOARD_STORAGE"));

        let err = load(&[
            ("TASKBOARD_STORAGE", "memory"),
            ("DATABASE_MIN_CONNECTIONS", "20"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("DATABASE_MIN_CONNECTIONS"));
    }

    #[test]
    fn test_pool_config_carries_limits() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://db/taskboard"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("DATABASE_MIN_CONNECTIONS", "1"),
            ("RUN_MIGRATIONS", "false"),
        ])
        .unwrap();

        let pool = config.database.pool_config();
        assert_eq!(pool.url, "postgresql://db/taskboard");
        assert_eq!(pool.max_connections, 4);
        assert_eq!(pool.min_connections, 1);
        assert!(!config.run_migrations);
    }
}
