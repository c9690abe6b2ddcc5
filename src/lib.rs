//! Request/response contract layer for the SGI stored-procedure façade.
//!
//! Every HTTP route of the service is the same five steps with different
//! names: resolve parameters, invoke one procedure, shape the result sets,
//! derive summaries, wrap everything in an envelope. This crate holds those
//! steps as reusable pieces plus the declarative [`Route`] that ties them
//! together, and stays free of HTTP and database types.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sgi::{Facade, ParamSpec, RawInput, Route, ScriptedInvoker, Shape};
//!
//! # async fn demo() {
//! let route = Route::new("/conteoJardines", "sp_ContarJardinesPorRegion")
//!     .params([ParamSpec::int("codigoRegion", "CodigoRegion").or_zero()])
//!     .data(Shape::each(&[("region", "Region"), ("totalJardines", "TotalJardines")]))
//!     .counted();
//!
//! let facade = Facade::new(Arc::new(ScriptedInvoker::new()));
//! let result = facade.execute(&route, &RawInput::query([("codigoRegion", "5")])).await;
//! # let _ = result;
//! # }
//! ```

pub mod aggregate;
pub mod envelope;
pub mod error;
pub mod facade;
pub mod invoke;
pub mod params;
pub mod route;
pub mod scripted;
pub mod shape;
pub mod value;

pub use aggregate::{Aggregate, Operand, Precision};
pub use envelope::Envelope;
pub use error::FacadeError;
pub use facade::Facade;
pub use invoke::{
    InvokeError, Outcome, ProcedureCall, ProcedureInvoker, RetryPolicy, invoke_with_refresh,
};
pub use params::{
    BoundParam, Fallback, ParamSpec, ParamType, ParameterSet, RawInput, SqlValue, ValidationError,
    resolve,
};
pub use route::{Condition, DB_ERROR, Guard, NO_DATA, OnEmpty, Rejection, Route, Summary};
pub use scripted::ScriptedInvoker;
pub use shape::{Field, GroupRatio, Member, Nested, Shape, ShapeError};
pub use value::{ResultSet, Row, Scalar};
