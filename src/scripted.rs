//! In-memory [`ProcedureInvoker`] with canned responses.
//!
//! Records every call so callers can check what was (or was not) invoked.
//! Used by the test suites of this crate and of the HTTP host, and handy
//! for running the server without a database.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::invoke::{InvokeError, ProcedureCall, ProcedureInvoker};
use crate::value::ResultSet;

#[derive(Debug, Default)]
pub struct ScriptedInvoker {
    fallback: Option<Result<Vec<ResultSet>, InvokeError>>,
    by_procedure: HashMap<&'static str, Result<Vec<ResultSet>, InvokeError>>,
    auth_failures: AtomicUsize,
    refreshes: AtomicUsize,
    calls: Mutex<Vec<ProcedureCall>>,
}

impl ScriptedInvoker {
    /// Every procedure returns no result sets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every procedure returns `sets`.
    pub fn returning(sets: Vec<ResultSet>) -> Self {
        Self {
            fallback: Some(Ok(sets)),
            ..Self::default()
        }
    }

    /// Every procedure fails with a generic error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fallback: Some(Err(InvokeError::Failed(message.into()))),
            ..Self::default()
        }
    }

    /// `procedure` returns `sets`, overriding the default response.
    pub fn with_procedure(mut self, procedure: &'static str, sets: Vec<ResultSet>) -> Self {
        self.by_procedure.insert(procedure, Ok(sets));
        self
    }

    /// `procedure` fails with `err`.
    pub fn with_failure(mut self, procedure: &'static str, err: InvokeError) -> Self {
        self.by_procedure.insert(procedure, Err(err));
        self
    }

    /// The next `count` calls fail with an auth error, whatever the procedure.
    pub fn failing_auth(self, count: usize) -> Self {
        self.auth_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<ProcedureCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcedureInvoker for ScriptedInvoker {
    async fn invoke(&self, call: &ProcedureCall) -> Result<Vec<ResultSet>, InvokeError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.clone());
        }

        let pending_auth = self
            .auth_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if pending_auth {
            return Err(InvokeError::Auth("Token is expired".into()));
        }

        self.by_procedure
            .get(call.procedure)
            .or(self.fallback.as_ref())
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn refresh_credential(&self) -> Result<(), InvokeError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
