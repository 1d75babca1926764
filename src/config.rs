/// Configuration management for the ban checker
use crate::error::{CheckError, CheckResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default ban server address
pub const DEFAULT_BAN_SERVER_HOST: &str = "51.89.97.102";

/// Default ban server UDP port
pub const DEFAULT_BAN_SERVER_PORT: u16 = 61455;

/// Default reply window for a ban query, in seconds
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 5;

/// Default name lookup service
pub const DEFAULT_RESOLVER_BASE_URL: &str = "https://sc-cache.com";

/// Default total timeout for a name lookup, in seconds
pub const DEFAULT_RESOLVER_TIMEOUT_SECS: u64 = 10;

/// Main checker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    pub ban_server: BanServerConfig,
    pub resolver: ResolverConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Ban server endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanServerConfig {
    pub host: String,
    pub port: u16,
    /// Reply window in seconds
    pub timeout_secs: u64,
}

impl BanServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BanServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BAN_SERVER_HOST.to_string(),
            port: DEFAULT_BAN_SERVER_PORT,
            timeout_secs: DEFAULT_QUERY_TIMEOUT_SECS,
        }
    }
}

/// Name resolution service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Base URL, lookups go to `{base_url}/n/{handle}`
    pub base_url: String,
    /// User-Agent header for HTTP requests
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl ResolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RESOLVER_BASE_URL.to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            timeout_secs: DEFAULT_RESOLVER_TIMEOUT_SECS,
        }
    }
}

/// Identifier cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub snapshot_path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl CheckerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> CheckResult<Self> {
        dotenv::dotenv().ok();

        let host = env::var("BE_SERVER_HOST")
            .unwrap_or_else(|_| DEFAULT_BAN_SERVER_HOST.to_string());
        let port = env::var("BE_SERVER_PORT")
            .unwrap_or_else(|_| DEFAULT_BAN_SERVER_PORT.to_string())
            .parse()
            .map_err(|_| CheckError::Config("Invalid ban server port".to_string()))?;
        let query_timeout = env::var("BE_QUERY_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_QUERY_TIMEOUT_SECS.to_string())
            .parse()
            .unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS);

        let base_url = env::var("RESOLVER_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_RESOLVER_BASE_URL.to_string());
        let user_agent =
            env::var("RESOLVER_USER_AGENT").unwrap_or_else(|_| "Mozilla/5.0".to_string());
        let resolver_timeout = env::var("RESOLVER_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_RESOLVER_TIMEOUT_SECS.to_string())
            .parse()
            .unwrap_or(DEFAULT_RESOLVER_TIMEOUT_SECS);

        let snapshot_path: PathBuf = env::var("CACHE_SNAPSHOT_PATH")
            .unwrap_or_else(|_| "./data/rid_cache.json".to_string())
            .into();

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(CheckerConfig {
            ban_server: BanServerConfig {
                host,
                port,
                timeout_secs: query_timeout,
            },
            resolver: ResolverConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                user_agent,
                timeout_secs: resolver_timeout,
            },
            cache: CacheConfig { snapshot_path },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> CheckResult<()> {
        if self.ban_server.host.is_empty() {
            return Err(CheckError::Config("Ban server host cannot be empty".to_string()));
        }

        if self.ban_server.port == 0 {
            return Err(CheckError::Config("Ban server port cannot be 0".to_string()));
        }

        if self.ban_server.timeout_secs == 0 || self.resolver.timeout_secs == 0 {
            return Err(CheckError::Config("Timeouts must be at least 1 second".to_string()));
        }

        if self.resolver.base_url.is_empty() {
            return Err(CheckError::Config("Resolver base URL cannot be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> CheckerConfig {
        CheckerConfig {
            ban_server: BanServerConfig::default(),
            resolver: ResolverConfig::default(),
            cache: CacheConfig {
                snapshot_path: PathBuf::from("./data/rid_cache.json"),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    #[test]
    fn test_defaults() {
        let server = BanServerConfig::default();
        assert_eq!(server.port, 61455);
        assert_eq!(server.timeout(), Duration::from_secs(5));

        let resolver = ResolverConfig::default();
        assert_eq!(resolver.timeout(), Duration::from_secs(10));
        assert_eq!(resolver.user_agent, "Mozilla/5.0");
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = sample_config();
        config.ban_server.host.clear();
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.ban_server.port = 0;
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.resolver.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
