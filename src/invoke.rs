//! Procedure Invoker seam.
//!
//! The façade never owns a connection. It talks to an injected
//! [`ProcedureInvoker`] that binds typed parameters, runs one named
//! procedure and hands back every result set. Credential lifecycle stays on
//! the collaborator's side; the façade only asks for a refresh when an
//! invocation fails with [`InvokeError::Auth`], and then retries once.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::params::{BoundParam, ParameterSet};
use crate::value::ResultSet;

/// Invocation failure as reported by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    /// The credential was rejected. Eligible for one refresh-and-retry.
    #[error("credential rejected: {0}")]
    Auth(String),

    /// Anything else: transport, timeout, procedure error.
    #[error("{0}")]
    Failed(String),
}

impl InvokeError {
    pub fn is_auth(&self) -> bool {
        matches!(self, InvokeError::Auth(_))
    }
}

/// One named procedure with its bound parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureCall {
    pub procedure: &'static str,
    pub params: Vec<BoundParam>,
}

impl ProcedureCall {
    pub fn new(procedure: &'static str, params: &ParameterSet) -> Self {
        Self {
            procedure,
            params: params.bound(),
        }
    }
}

/// Capability the façade consumes: run a procedure, get rows or an error.
#[async_trait]
pub trait ProcedureInvoker: Send + Sync {
    /// Run `call` and return every result set it produced, in order.
    async fn invoke(&self, call: &ProcedureCall) -> Result<Vec<ResultSet>, InvokeError>;

    /// Re-acquire the credential used for new connections.
    async fn refresh_credential(&self) -> Result<(), InvokeError>;

    /// Cheap reachability check for readiness probes.
    async fn ping(&self) -> Result<(), InvokeError> {
        Ok(())
    }
}

/// Rows came back, or the procedure ran fine and returned nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rows(Vec<ResultSet>),
    Empty,
}

impl Outcome {
    /// A call is empty when it produced no result sets or its first result
    /// set has no rows.
    pub fn from_sets(sets: Vec<ResultSet>) -> Self {
        match sets.first() {
            Some(first) if !first.is_empty() => Outcome::Rows(sets),
            _ => Outcome::Empty,
        }
    }
}

/// Pause taken before the single credential-refresh retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

/// Invoke `call`, refreshing the credential and retrying exactly once if
/// the first attempt is rejected for authentication reasons.
pub async fn invoke_with_refresh(
    invoker: &dyn ProcedureInvoker,
    call: &ProcedureCall,
    policy: RetryPolicy,
) -> Result<Outcome, InvokeError> {
    debug!(
        procedure = call.procedure,
        params = call.params.len(),
        "invoking procedure"
    );

    let first = invoker.invoke(call).await;
    let sets = match first {
        Ok(sets) => sets,
        Err(InvokeError::Auth(reason)) => {
            warn!(
                procedure = call.procedure,
                reason = %reason,
                "credential rejected, refreshing before single retry"
            );
            if !policy.delay.is_zero() {
                tokio::time::sleep(policy.delay).await;
            }
            metrics::counter!("sgi_credential_refresh_total").increment(1);
            invoker.refresh_credential().await.inspect_err(|err| {
                error!(procedure = call.procedure, error = %err, "credential refresh failed");
            })?;

            invoker.invoke(call).await.inspect_err(|err| {
                error!(procedure = call.procedure, error = %err, "retry after refresh failed");
            })?
        }
        Err(err) => {
            error!(procedure = call.procedure, error = %err, "procedure invocation failed");
            return Err(err);
        }
    };

    Ok(Outcome::from_sets(sets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedInvoker;
    use crate::value::Row;

    fn call() -> ProcedureCall {
        ProcedureCall {
            procedure: "sp_Test",
            params: Vec::new(),
        }
    }

    fn one_row() -> Vec<ResultSet> {
        vec![ResultSet::new(vec![Row::new().with("Total", 1)])]
    }

    #[test]
    fn empty_first_set_is_empty_outcome() {
        assert_eq!(Outcome::from_sets(Vec::new()), Outcome::Empty);
        assert_eq!(
            Outcome::from_sets(vec![ResultSet::default(), ResultSet::new(vec![Row::new()])]),
            Outcome::Empty
        );
        assert!(matches!(Outcome::from_sets(one_row()), Outcome::Rows(_)));
    }

    #[tokio::test]
    async fn auth_failure_is_retried_once_after_refresh() {
        let invoker = ScriptedInvoker::returning(one_row()).failing_auth(1);
        let outcome = invoke_with_refresh(&invoker, &call(), RetryPolicy::immediate())
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::Rows(_)));
        assert_eq!(invoker.call_count(), 2);
        assert_eq!(invoker.refresh_count(), 1);
    }

    #[tokio::test]
    async fn second_auth_failure_surfaces() {
        let invoker = ScriptedInvoker::returning(one_row()).failing_auth(2);
        let err = invoke_with_refresh(&invoker, &call(), RetryPolicy::immediate())
            .await
            .unwrap_err();

        assert!(err.is_auth());
        assert_eq!(invoker.call_count(), 2);
        assert_eq!(invoker.refresh_count(), 1);
    }

    #[tokio::test]
    async fn generic_failure_is_not_retried() {
        let invoker = ScriptedInvoker::failing("connection reset");
        let err = invoke_with_refresh(&invoker, &call(), RetryPolicy::immediate())
            .await
            .unwrap_err();

        assert_eq!(err, InvokeError::Failed("connection reset".into()));
        assert_eq!(invoker.call_count(), 1);
        assert_eq!(invoker.refresh_count(), 0);
    }
}
