//! SQL Server collaborator for the SGI façade.
//!
//! Implements [`sgi::ProcedureInvoker`] over TDS with `tiberius`: renders
//! `EXEC` statements with named parameters, collects every result set,
//! converts column data to the façade's value model, and owns the
//! connection pool and the credential refresh cycle.
//!
//! Authentication failures (SQL Server error 18456, expired access tokens)
//! surface as [`sgi::InvokeError::Auth`] so the façade can ask for a
//! refresh and retry once. Timeouts and everything else are generic
//! failures.

pub mod config;
mod convert;
pub mod error;
pub mod invoker;
pub mod pool;

pub use config::{AuthConfig, DatabaseConfig};
pub use error::MssqlError;
pub use invoker::MssqlInvoker;
pub use pool::Pool;
