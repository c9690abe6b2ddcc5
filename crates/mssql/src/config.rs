use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::MssqlError;

/// SQL Server connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Server host name
    #[serde(default)]
    pub host: String,

    /// TDS port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name
    #[serde(default)]
    pub database: String,

    /// How connections authenticate
    #[serde(default)]
    pub auth: AuthConfig,

    /// Require TLS for the whole session
    #[serde(default = "default_true")]
    pub encrypt: bool,

    /// Accept any server certificate
    #[serde(default)]
    pub trust_server_certificate: bool,

    /// Upper bound on open connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// TCP connect plus login, in seconds
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Single procedure call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub query_timeout_secs: u64,
}

/// Credential source.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum AuthConfig {
    /// SQL Server login.
    Sql { user: String, password: String },
    /// Pre-acquired Entra ID access token, read from a file (preferred when
    /// set) or an environment variable. Re-read on every refresh.
    AadToken {
        #[serde(default)]
        token_file: Option<PathBuf>,
        #[serde(default = "default_token_env")]
        token_env: String,
    },
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig::AadToken {
            token_file: None,
            token_env: default_token_env(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            database: String::new(),
            auth: AuthConfig::default(),
            encrypt: default_true(),
            trust_server_certificate: false,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_timeout_secs(),
            query_timeout_secs: default_timeout_secs(),
        }
    }
}

impl DatabaseConfig {
    /// Fail fast on settings no connection could succeed with.
    pub fn validate(&self) -> Result<(), MssqlError> {
        if self.host.trim().is_empty() {
            return Err(MssqlError::Config("database host is required".into()));
        }
        if self.database.trim().is_empty() {
            return Err(MssqlError::Config("database name is required".into()));
        }
        if self.max_connections == 0 {
            return Err(MssqlError::Config(
                "max_connections must be at least 1".into(),
            ));
        }
        if let AuthConfig::Sql { user, .. } = &self.auth {
            if user.is_empty() {
                return Err(MssqlError::Config("sql auth requires a user".into()));
            }
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

fn default_port() -> u16 {
    1433
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> usize {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_token_env() -> String {
    "SGI_DB_ACCESS_TOKEN".to_string()
}
