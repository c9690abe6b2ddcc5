//! SGI Server - HTTP API over the institutional stored procedures
//!
//! This crate hosts the `sgi` façade behind axum. Each endpoint is a
//! declarative [`sgi::Route`]; two generic handlers (query string and JSON
//! body) run every one of them through [`sgi::Facade::execute`] and map the
//! outcome onto the shared response envelope.
//!
//! # Features
//!
//! - **Catalog**: education, DPPI, DPGR, budget, lookup lists, regions,
//!   staff indicators, costs and login
//! - **Middleware**: request id tracking, structured logging, panic
//!   recovery, CORS, compression
//! - **Configuration**: `.env`, optional `server.*` file and `SGI_SERVER__*`
//!   environment variables
//! - **Health & Metrics**: liveness and readiness probes, Prometheus text
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /`, `GET /health`, `GET /ready`, `GET /metrics`
//! - `GET /api/educacion/*`, `GET /api/dppi/*`, `GET /api/dpgr/*`
//! - `POST /api/presupuesto/*` (plus `GET /api/presupuesto/obtenerAniosEjecucion`)
//! - `POST /api/parametros/obtenerDirecciones`, `POST /api/parametros/obtenerSubRubros`,
//!   `GET /api/parametros/obtenerTodosLosRubros`
//! - `GET /api/regiones/tbRegion`, `GET /api/persona/*`, `GET /api/costos/*`
//! - `POST /api/login`

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
