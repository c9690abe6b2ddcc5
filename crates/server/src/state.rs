use crate::config::ServerConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use sgi::{Facade, FacadeError, ProcedureInvoker};
use std::sync::Arc;

use crate::error::ServerError;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// The one execution path every catalog route goes through
    pub facade: Facade,

    /// Prometheus render handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Create new server state around `invoker`
    pub fn new(config: ServerConfig, invoker: Arc<dyn ProcedureInvoker>) -> Self {
        let facade = Facade::new(invoker).with_retry(config.retry_policy());
        Self {
            config: Arc::new(config),
            facade,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Whether failure envelopes carry the diagnostic `error` field.
    pub fn expose_errors(&self) -> bool {
        self.config.is_development()
    }

    pub fn reject(&self, err: FacadeError) -> ServerError {
        ServerError::facade(err, self.expose_errors())
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub name: &'static str,
    pub version: &'static str,
    pub environment: crate::config::Environment,
    pub uptime_seconds: u64,
}
