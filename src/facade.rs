//! The single execution path shared by every route.
//!
//! Order is fixed: resolve parameters, invoke (with at most one
//! credential-refresh retry), check for emptiness, then shape. Shaping and
//! aggregation never run over zero rows.

use std::sync::Arc;

use tracing::debug;

use crate::envelope::Envelope;
use crate::error::FacadeError;
use crate::invoke::{Outcome, ProcedureCall, ProcedureInvoker, RetryPolicy, invoke_with_refresh};
use crate::params::{RawInput, resolve};
use crate::route::{OnEmpty, Rejection, Route};

/// Executes [`Route`]s against an injected invoker.
#[derive(Clone)]
pub struct Facade {
    invoker: Arc<dyn ProcedureInvoker>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for Facade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Facade").field("retry", &self.retry).finish()
    }
}

impl Facade {
    pub fn new(invoker: Arc<dyn ProcedureInvoker>) -> Self {
        Self {
            invoker,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn invoker(&self) -> &Arc<dyn ProcedureInvoker> {
        &self.invoker
    }

    pub async fn execute(&self, route: &Route, input: &RawInput) -> Result<Envelope, FacadeError> {
        let params = resolve(&route.params, input).inspect_err(|err| {
            debug!(route = route.path, param = err.param, message = %err, "validation failed");
        })?;

        let call = ProcedureCall::new(route.procedure, &params);
        let outcome = invoke_with_refresh(self.invoker.as_ref(), &call, self.retry).await;

        let sets = match outcome {
            Ok(Outcome::Rows(sets)) => {
                record(route.procedure, "rows");
                sets
            }
            Ok(Outcome::Empty) => {
                record(route.procedure, "empty");
                debug!(route = route.path, procedure = route.procedure, "no rows returned");
                return match route.on_empty {
                    OnEmpty::NotFound(message) => Err(FacadeError::no_data(message)),
                    OnEmpty::EmptyOk(message) => {
                        Ok(Envelope::success(serde_json::json!([])).with_message(message))
                    }
                };
            }
            Err(source) => {
                record(route.procedure, "error");
                return Err(FacadeError::Invocation {
                    message: route.failure.to_string(),
                    source,
                });
            }
        };

        let rows = sets.first().map(|set| set.rows()).unwrap_or_default();

        if let Some(guard) = &route.guard {
            if let Some(rejection) = rows.first().and_then(|row| guard.check(row)) {
                debug!(route = route.path, ?rejection, "rejected by row guard");
                return Err(match rejection {
                    Rejection::Unauthorized(message) => FacadeError::unauthorized(message),
                    Rejection::NotFound(message) => FacadeError::no_data(message),
                });
            }
        }

        let data = route
            .data
            .render(&sets)
            .map_err(|source| FacadeError::Unexpected {
                message: route.failure.to_string(),
                source,
            })?;

        let mut envelope = Envelope::success(data);
        if let Some(set) = route.count {
            envelope = envelope.with_count(sets.get(set).map_or(0, |s| s.len()));
        }
        if let Some(summary) = &route.summary {
            envelope = envelope.with_summary(summary.evaluate(rows, &params));
        }
        if route.echo_params {
            envelope = envelope.with_params(params.echo());
        }
        for (name, aggregate) in &route.extras {
            envelope = envelope.with_extra(*name, aggregate.evaluate(rows));
        }
        Ok(envelope)
    }
}

fn record(procedure: &'static str, outcome: &'static str) {
    metrics::counter!(
        "sgi_procedure_invocations_total",
        "procedure" => procedure,
        "outcome" => outcome
    )
    .increment(1);
}
