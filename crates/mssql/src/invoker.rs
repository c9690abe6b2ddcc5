use async_trait::async_trait;
use futures::TryStreamExt;
use sgi::{InvokeError, ProcedureCall, ProcedureInvoker, ResultSet};
use tiberius::{QueryItem, ToSql};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;
use crate::convert::{Param, SetCollector, exec_statement, result_sets};
use crate::error::MssqlError;
use crate::pool::Pool;

/// [`ProcedureInvoker`] backed by a SQL Server connection pool.
pub struct MssqlInvoker {
    pool: Pool,
}

impl MssqlInvoker {
    /// Validate `config` and build the pool. Connections open lazily.
    pub fn new(config: DatabaseConfig) -> Result<Self, MssqlError> {
        config.validate()?;
        Ok(Self {
            pool: Pool::new(config),
        })
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Open (and return) one connection to prove the settings work.
    pub async fn ping(&self) -> Result<(), MssqlError> {
        let mut checkout = self.pool.get().await?;
        checkout.client()?.simple_query("SELECT 1").await?.into_results().await?;
        checkout.release();
        Ok(())
    }

    async fn run(&self, call: &ProcedureCall) -> Result<Vec<ResultSet>, MssqlError> {
        let sql = exec_statement(call.procedure, &call.params);
        let params: Vec<Param<'_>> = call.params.iter().map(|p| Param(&p.value)).collect();
        let refs: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();

        let mut checkout = self.pool.get().await?;
        let limit = self.pool.config().query_timeout();
        let client = checkout.client()?;
        let sets = timeout(limit, async {
            let mut stream = client.query(sql.as_str(), &refs).await?;
            let mut sets = SetCollector::default();
            while let Some(item) = stream.try_next().await? {
                match item {
                    QueryItem::Metadata(_) => sets.metadata(),
                    QueryItem::Row(row) => sets.row(row),
                }
            }
            Ok::<_, MssqlError>(sets.finish())
        })
        .await
        .map_err(|_| MssqlError::Timeout("query", limit))??;

        checkout.release();
        debug!(
            procedure = call.procedure,
            result_sets = sets.len(),
            "procedure executed"
        );
        Ok(result_sets(sets))
    }
}

#[async_trait]
impl ProcedureInvoker for MssqlInvoker {
    async fn invoke(&self, call: &ProcedureCall) -> Result<Vec<ResultSet>, InvokeError> {
        self.run(call).await.map_err(|err| {
            if err.is_auth() {
                warn!(procedure = call.procedure, error = %err, "database rejected credential");
            }
            InvokeError::from(err)
        })
    }

    async fn refresh_credential(&self) -> Result<(), InvokeError> {
        self.pool.refresh().await.map_err(InvokeError::from)
    }

    async fn ping(&self) -> Result<(), InvokeError> {
        MssqlInvoker::ping(self).await.map_err(InvokeError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_incomplete_config() {
        let err = MssqlInvoker::new(DatabaseConfig::default()).err().unwrap();
        assert!(matches!(err, MssqlError::Config(_)));
    }

    #[test]
    fn test_new_is_lazy() {
        let invoker = MssqlInvoker::new(DatabaseConfig {
            host: "127.0.0.1".into(),
            database: "sgi".into(),
            ..DatabaseConfig::default()
        })
        .unwrap();
        assert_eq!(invoker.pool().idle_count(), 0);
    }
}
