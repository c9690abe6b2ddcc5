//! API route handlers
//!
//! Every catalog endpoint is a [`Route`] value served by one of two generic
//! handlers: [`serve_query`] reads parameters from the query string,
//! [`serve_body`] from a JSON object body. The modules below only declare
//! routes.
//!
//! - `health`: service info, liveness, readiness and metrics
//! - `educacion`, `dppi`, `dpgr`, `presupuesto`, `parametros`, `regiones`,
//!   `persona`, `costos`, `login`: the procedure catalog

pub mod costos;
pub mod dpgr;
pub mod dppi;
pub mod educacion;
pub mod health;
pub mod login;
pub mod parametros;
pub mod persona;
pub mod presupuesto;
pub mod regiones;

use crate::error::{INVALID_BODY, INVALID_QUERY, ServerError, ServerResult};
use crate::state::ServerState;
use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{OriginalUri, Query, State};
use axum::http::{Method, StatusCode};
use axum::routing::{MethodRouter, get, post};
use serde_json::{Map, Value as JsonValue, json};
use sgi::{Envelope, RawInput, Route};
use std::collections::HashMap;
use std::sync::Arc;

pub type ApiRouter = Router<Arc<ServerState>>;

/// Route groups mounted under `/api`.
pub const GROUPS: [&str; 9] = [
    "/api/educacion",
    "/api/dppi",
    "/api/dpgr",
    "/api/presupuesto",
    "/api/parametros",
    "/api/regiones",
    "/api/persona",
    "/api/costos",
    "/api/login",
];

/// Mount catalog routes on a router by transport.
pub trait Catalog {
    /// `GET route.path`, parameters from the query string.
    fn get_route(self, route: Route) -> Self;
    /// `POST route.path`, parameters from a JSON object body.
    fn post_route(self, route: Route) -> Self;
}

impl Catalog for ApiRouter {
    fn get_route(self, route: Route) -> Self {
        let path = route.path;
        self.route(path, query_handler(route))
    }

    fn post_route(self, route: Route) -> Self {
        let path = route.path;
        self.route(path, body_handler(route))
    }
}

fn query_handler(route: Route) -> MethodRouter<Arc<ServerState>> {
    let route = Arc::new(route);
    get(
        move |State(state): State<Arc<ServerState>>,
              query: Result<Query<HashMap<String, String>>, QueryRejection>| {
            let route = route.clone();
            async move { serve_query(state, route, query).await }
        },
    )
}

fn body_handler(route: Route) -> MethodRouter<Arc<ServerState>> {
    let route = Arc::new(route);
    post(
        move |State(state): State<Arc<ServerState>>,
              body: Result<Bytes, BytesRejection>| {
            let route = route.clone();
            async move { serve_body(state, route, body).await }
        },
    )
}

/// Serve `route` with parameters taken from the query string.
pub async fn serve_query(
    state: Arc<ServerState>,
    route: Arc<Route>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> ServerResult<Json<Envelope>> {
    let Query(pairs) = query.map_err(|err| {
        tracing::debug!(route = route.path, error = %err, "malformed query string");
        ServerError::BadRequest(INVALID_QUERY.to_string())
    })?;
    execute(&state, &route, RawInput::Query(pairs)).await
}

/// Serve `route` with parameters taken from a JSON object body. An empty
/// body counts as `{}`.
pub async fn serve_body(
    state: Arc<ServerState>,
    route: Arc<Route>,
    body: Result<Bytes, BytesRejection>,
) -> ServerResult<Json<Envelope>> {
    let body = body.map_err(|err| {
        tracing::debug!(route = route.path, error = %err, "unreadable request body");
        body_rejection(err.status())
    })?;
    let object = parse_object(&body).ok_or_else(|| {
        tracing::debug!(route = route.path, bytes = body.len(), "rejected request body");
        ServerError::BadRequest(INVALID_BODY.to_string())
    })?;
    execute(&state, &route, RawInput::Body(object)).await
}

fn body_rejection(status: StatusCode) -> ServerError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge
    } else {
        ServerError::BadRequest(INVALID_BODY.to_string())
    }
}

fn parse_object(body: &[u8]) -> Option<Map<String, JsonValue>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Some(Map::new());
    }
    match serde_json::from_slice(body).ok()? {
        JsonValue::Object(map) => Some(map),
        _ => None,
    }
}

async fn execute(
    state: &ServerState,
    route: &Route,
    input: RawInput,
) -> ServerResult<Json<Envelope>> {
    state
        .facade
        .execute(route, &input)
        .await
        .map(Json)
        .map_err(|err| state.reject(err))
}

/// API version and base info
///
/// Returns server information including version and the mounted route
/// groups. This is the root endpoint (GET /).
pub async fn api_info() -> Json<JsonValue> {
    Json(json!({
        "name": "SGI Server",
        "version": env!("CARGO_PKG_VERSION"),
        "groups": GROUPS,
        "endpoints": ["/health", "/ready", "/metrics"]
    }))
}

/// 404 Not Found handler, also answering known paths called with the wrong
/// method.
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> ServerError {
    ServerError::RouteNotFound {
        method: method.to_string(),
        uri: uri.to_string(),
    }
}
