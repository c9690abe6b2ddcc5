use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sgi::{Envelope, FacadeError};

pub type ServerResult<T> = Result<T, ServerError>;

pub const INTERNAL_ERROR: &str = "Error interno del servidor";
pub const INVALID_BODY: &str = "El cuerpo de la petición debe ser un objeto JSON válido";
pub const INVALID_QUERY: &str = "Los parámetros de consulta no son válidos";

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("El cuerpo de la petición supera el tamaño máximo permitido")]
    PayloadTooLarge,

    #[error("Ruta no encontrada: {method} {uri}")]
    RouteNotFound { method: String, uri: String },

    /// A façade outcome. `expose` controls the diagnostic `error` field.
    #[error("{source}")]
    Facade {
        #[source]
        source: FacadeError,
        expose: bool,
    },

    #[error("Error interno del servidor")]
    Internal { detail: String, expose: bool },

    #[error("Servicio no disponible")]
    Unavailable { detail: String, expose: bool },
}

impl ServerError {
    pub fn facade(source: FacadeError, expose: bool) -> Self {
        ServerError::Facade { source, expose }
    }

    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ServerError::Facade { source, .. } => StatusCode::from_u16(source.status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ServerError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            ServerError::Facade {
                source,
                expose: true,
            } => source.detail(),
            ServerError::Internal {
                detail,
                expose: true,
            }
            | ServerError::Unavailable {
                detail,
                expose: true,
            } => Some(detail.clone()),
            _ => None,
        }
    }

    pub fn envelope(&self) -> Envelope {
        Envelope::failure(self.to_string()).with_error(self.detail())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.envelope())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sgi::{InvokeError, ValidationError};

    #[test]
    fn test_facade_status_passthrough() {
        let err = ServerError::facade(
            FacadeError::from(ValidationError::new("ano", "El año es requerido")),
            true,
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let envelope = err.envelope();
        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("El año es requerido"));
        assert!(envelope.error.is_none());
    }

    #[test]
    fn test_detail_only_when_exposed() {
        let failure = || FacadeError::Invocation {
            message: "Error al consultar la base de datos".into(),
            source: InvokeError::Failed("Invalid object name 'sp_X'".into()),
        };

        let hidden = ServerError::facade(failure(), false).envelope();
        assert!(hidden.error.is_none());

        let shown = ServerError::facade(failure(), true).envelope();
        assert_eq!(
            shown.message.as_deref(),
            Some("Error al consultar la base de datos")
        );
        assert!(shown.error.unwrap().contains("sp_X"));
    }

    #[test]
    fn test_route_not_found_message() {
        let err = ServerError::RouteNotFound {
            method: "GET".into(),
            uri: "/api/nada".into(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Ruta no encontrada: GET /api/nada");
    }
}
