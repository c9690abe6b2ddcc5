use mssql::DatabaseConfig;
use serde::{Deserialize, Serialize};
use sgi::RetryPolicy;
use std::net::SocketAddr;
use std::time::Duration;

/// Runtime mode. Only development responses carry diagnostic detail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Development,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Runtime mode
    #[serde(default)]
    pub environment: Environment,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Pause before retrying a call whose credential was rejected, in ms
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// SQL Server connection
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            environment: Environment::default(),
            log_level: default_log_level(),
            enable_cors: default_true(),
            metrics_enabled: default_true(),
            max_body_size_mb: default_max_body_size_mb(),
            retry_delay_ms: default_retry_delay_ms(),
            database: DatabaseConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `server.*` file and
    /// `SGI_SERVER__*` environment variables, in increasing precedence.
    pub fn load() -> anyhow::Result<Self> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();

        let builder = config::Config::builder()
            .add_source(config::File::with_name("server").required(false))
            .add_source(config::Environment::with_prefix("SGI_SERVER").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.database.validate()?;
        if self.max_body_size_mb == 0 {
            anyhow::bail!("max_body_size_mb must be at least 1");
        }
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_delay(Duration::from_millis(self.retry_delay_ms))
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_body_size_mb() -> usize {
    1
}

fn default_retry_delay_ms() -> u64 {
    1000
}
