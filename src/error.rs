use thiserror::Error;

use crate::invoke::InvokeError;
use crate::params::ValidationError;
use crate::shape::ShapeError;

/// Terminal outcome of a request that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FacadeError {
    /// Unusable input, caught before any invocation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The call worked but there is nothing to return.
    #[error("{message}")]
    NoData { message: String },

    /// Identity check rejected the supplied credentials.
    #[error("{message}")]
    Unauthorized { message: String },

    /// The invocation failed, after the single retry when one was allowed.
    #[error("{message}")]
    Invocation {
        message: String,
        #[source]
        source: InvokeError,
    },

    /// Rows came back in a form the route cannot shape.
    #[error("{message}")]
    Unexpected {
        message: String,
        #[source]
        source: ShapeError,
    },
}

impl FacadeError {
    pub fn no_data(message: impl Into<String>) -> Self {
        FacadeError::NoData {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        FacadeError::Unauthorized {
            message: message.into(),
        }
    }

    /// HTTP status this error maps to.
    pub fn status(&self) -> u16 {
        match self {
            FacadeError::Validation(_) => 400,
            FacadeError::Unauthorized { .. } => 401,
            FacadeError::NoData { .. } => 404,
            FacadeError::Invocation { .. } | FacadeError::Unexpected { .. } => 500,
        }
    }

    /// Client-facing message.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Underlying cause, for the development-only `error` field.
    pub fn detail(&self) -> Option<String> {
        match self {
            FacadeError::Invocation { source, .. } => Some(source.to_string()),
            FacadeError::Unexpected { source, .. } => Some(source.to_string()),
            _ => None,
        }
    }
}
