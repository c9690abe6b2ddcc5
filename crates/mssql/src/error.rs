use std::time::Duration;

use sgi::InvokeError;
use thiserror::Error;

/// SQL Server login failed.
const LOGIN_FAILED: u32 = 18456;

#[derive(Debug, Error)]
pub enum MssqlError {
    #[error("invalid database configuration: {0}")]
    Config(String),

    #[error("could not read access token: {0}")]
    Credential(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tds(#[from] tiberius::error::Error),

    #[error("{0} timed out after {1:?}")]
    Timeout(&'static str, Duration),

    #[error("connection pool closed")]
    PoolClosed,
}

impl MssqlError {
    /// Whether the server rejected the credential.
    pub fn is_auth(&self) -> bool {
        match self {
            MssqlError::Tds(tiberius::error::Error::Server(token)) if token.code() == LOGIN_FAILED => {
                true
            }
            MssqlError::Tds(err) => err.to_string().to_lowercase().contains("token is expired"),
            MssqlError::Credential(_) => true,
            _ => false,
        }
    }
}

impl From<MssqlError> for InvokeError {
    fn from(err: MssqlError) -> Self {
        if err.is_auth() {
            InvokeError::Auth(err.to_string())
        } else {
            InvokeError::Failed(err.to_string())
        }
    }
}
