//! Bounded connection pool with credential generations.
//!
//! A semaphore bounds how many connections are checked out at once and the
//! idle list holds connections ready for reuse. Every connection remembers
//! the credential generation it logged in with; bumping the generation on
//! refresh makes older idle connections unusable, so the next checkout logs
//! in again with the new credential.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use tiberius::{AuthMethod, Client, Config, EncryptionLevel};
use tokio::net::TcpStream;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::time::timeout;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use crate::config::{AuthConfig, DatabaseConfig};
use crate::error::MssqlError;

pub type MssqlClient = Client<Compat<TcpStream>>;

#[derive(Clone)]
enum Credential {
    Sql { user: String, password: String },
    AadToken(String),
}

impl Credential {
    fn auth_method(&self) -> AuthMethod {
        match self {
            Credential::Sql { user, password } => AuthMethod::sql_server(user, password),
            Credential::AadToken(token) => AuthMethod::aad_token(token),
        }
    }
}

async fn load_credential(auth: &AuthConfig) -> Result<Credential, MssqlError> {
    match auth {
        AuthConfig::Sql { user, password } => Ok(Credential::Sql {
            user: user.clone(),
            password: password.clone(),
        }),
        AuthConfig::AadToken {
            token_file: Some(path),
            ..
        } => {
            let token = tokio::fs::read_to_string(path).await.map_err(|err| {
                MssqlError::Credential(format!("{}: {err}", path.display()))
            })?;
            non_empty(token.trim(), &path.display().to_string()).map(Credential::AadToken)
        }
        AuthConfig::AadToken {
            token_file: None,
            token_env,
        } => {
            let token = std::env::var(token_env)
                .map_err(|_| MssqlError::Credential(format!("{token_env} is not set")))?;
            non_empty(token.trim(), token_env).map(Credential::AadToken)
        }
    }
}

fn non_empty(token: &str, source: &str) -> Result<String, MssqlError> {
    if token.is_empty() {
        Err(MssqlError::Credential(format!("{source} is empty")))
    } else {
        Ok(token.to_string())
    }
}

struct Idle {
    client: MssqlClient,
    generation: u64,
}

pub struct Pool {
    config: DatabaseConfig,
    credential: RwLock<Option<Credential>>,
    generation: AtomicU64,
    idle: Mutex<Vec<Idle>>,
    permits: Semaphore,
}

impl Pool {
    /// Build a pool. No connection is opened until the first checkout.
    pub fn new(config: DatabaseConfig) -> Self {
        let permits = Semaphore::new(config.max_connections.max(1));
        Self {
            config,
            credential: RwLock::new(None),
            generation: AtomicU64::new(0),
            idle: Mutex::new(Vec::new()),
            permits,
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or_default()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Check a connection out, reusing an idle one of the current
    /// generation or logging in anew.
    pub async fn get(&self) -> Result<Checkout<'_>, MssqlError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| MssqlError::PoolClosed)?;

        let generation = self.generation();
        let reused = self.idle.lock().ok().and_then(|mut idle| {
            // Stale entries are dropped here, which closes them.
            idle.retain(|entry| entry.generation == generation);
            idle.pop()
        });

        let client = match reused {
            Some(entry) => entry.client,
            None => self.connect().await?,
        };

        Ok(Checkout {
            pool: self,
            client: Some(client),
            generation,
            _permit: permit,
        })
    }

    /// Re-read the credential source and retire every idle connection.
    pub async fn refresh(&self) -> Result<(), MssqlError> {
        let fresh = load_credential(&self.config.auth).await?;
        if let Ok(mut slot) = self.credential.write() {
            *slot = Some(fresh);
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let retired = self
            .idle
            .lock()
            .map(|mut idle| idle.drain(..).count())
            .unwrap_or_default();
        info!(generation, retired, "database credential refreshed");
        Ok(())
    }

    async fn credential(&self) -> Result<Credential, MssqlError> {
        let cached = self.credential.read().ok().and_then(|slot| slot.clone());
        match cached {
            Some(credential) => Ok(credential),
            None => {
                let loaded = load_credential(&self.config.auth).await?;
                if let Ok(mut slot) = self.credential.write() {
                    *slot = Some(loaded.clone());
                }
                Ok(loaded)
            }
        }
    }

    async fn connect(&self) -> Result<MssqlClient, MssqlError> {
        let credential = self.credential().await?;

        let mut config = Config::new();
        config.host(&self.config.host);
        config.port(self.config.port);
        config.database(&self.config.database);
        config.application_name("sgi-server");
        config.authentication(credential.auth_method());
        config.encryption(if self.config.encrypt {
            EncryptionLevel::Required
        } else {
            EncryptionLevel::NotSupported
        });
        if self.config.trust_server_certificate {
            config.trust_cert();
        }

        let limit = self.config.connect_timeout();
        let tcp = timeout(limit, TcpStream::connect(config.get_addr()))
            .await
            .map_err(|_| MssqlError::Timeout("connect", limit))??;
        tcp.set_nodelay(true)?;

        let client = timeout(limit, Client::connect(config, tcp.compat_write()))
            .await
            .map_err(|_| MssqlError::Timeout("login", limit))??;

        debug!(host = %self.config.host, database = %self.config.database, "opened database connection");
        Ok(client)
    }

    fn put_back(&self, client: MssqlClient, generation: u64) {
        if generation != self.generation() {
            return;
        }
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < self.config.max_connections {
                idle.push(Idle { client, generation });
            }
        }
    }
}

/// A checked-out connection. Dropping it without [`Checkout::release`]
/// discards the connection.
pub struct Checkout<'a> {
    pool: &'a Pool,
    client: Option<MssqlClient>,
    generation: u64,
    _permit: SemaphorePermit<'a>,
}

impl Checkout<'_> {
    pub fn client(&mut self) -> Result<&mut MssqlClient, MssqlError> {
        self.client.as_mut().ok_or(MssqlError::PoolClosed)
    }

    /// Return the connection to the idle list.
    pub fn release(mut self) {
        if let Some(client) = self.client.take() {
            self.pool.put_back(client, self.generation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_from_env() {
        let var = "SGI_TEST_POOL_TOKEN_ENV";
        // SAFETY: test-local variable name, nothing else reads it.
        unsafe { std::env::set_var(var, "  abc.def  ") };
        let credential = load_credential(&AuthConfig::AadToken {
            token_file: None,
            token_env: var.into(),
        })
        .await
        .unwrap();
        assert!(matches!(credential, Credential::AadToken(t) if t == "abc.def"));
    }

    #[tokio::test]
    async fn test_missing_token_is_credential_error() {
        let err = load_credential(&AuthConfig::AadToken {
            token_file: None,
            token_env: "SGI_TEST_POOL_TOKEN_UNSET".into(),
        })
        .await
        .err()
        .unwrap();
        assert!(matches!(err, MssqlError::Credential(_)));
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_refresh_bumps_generation() {
        let pool = Pool::new(DatabaseConfig {
            auth: AuthConfig::Sql {
                user: "app".into(),
                password: "secret".into(),
            },
            ..DatabaseConfig::default()
        });
        assert_eq!(pool.generation(), 0);
        pool.refresh().await.unwrap();
        assert_eq!(pool.generation(), 1);
        assert_eq!(pool.idle_count(), 0);
    }
}
