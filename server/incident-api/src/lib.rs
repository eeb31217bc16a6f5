//! Incident Platform API
//!
//! HTTP + WebSocket service over incident-core. Incidents are stored in
//! PostgreSQL; every committed create/update is pushed to /ws/incidents.

pub mod config;
mod date;
pub mod db;
pub mod error;
mod handlers;
pub mod state;
mod types;
mod ws;

use std::sync::Arc;

use axum::{
  routing::{get, post},
  Router,
};
use incident_core::IncidentStore;

pub use config::ServerConfig;
pub use db::PgStore;
pub use error::{ApiError, ConfigError};
pub use handlers::health;
pub use state::AppState;
pub use types::ListQuery;
pub use ws::EVICTED_REASON;

/// All routes, generic over the store so tests can run without Postgres.
pub fn router<S: IncidentStore + 'static>(state: Arc<AppState<S>>) -> Router {
  Router::new()
    .route("/health", get(handlers::health))
    .route(
      "/incidents",
      post(handlers::create_incident::<S>).get(handlers::list_incidents::<S>),
    )
    .route(
      "/incidents/:id",
      get(handlers::get_incident::<S>).patch(handlers::update_incident::<S>),
    )
    .route("/ws/incidents", get(ws::ws_handler::<S>))
    .with_state(state)
}
