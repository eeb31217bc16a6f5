//! Binary entrypoint for the incident API.

use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use incident_api::{AppState, PgStore, ServerConfig};
use incident_core::{Broadcaster, IncidentService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let config = ServerConfig::from_env()?;

  let store = PgStore::connect(&config.database_url).await?;
  store.migrate().await?;

  let broadcaster = Arc::new(Broadcaster::new());
  let service = IncidentService::new(config.engine.clone(), store, broadcaster);
  let state = Arc::new(AppState::new(service));

  let app = incident_api::router(state).layer(cors_layer(&config.cors_origins));

  let addr = SocketAddr::new(config.bind_addr, config.port);
  tracing::info!(%addr, "incident-api listening");

  let listener = tokio::net::TcpListener::bind(addr).await?;
  axum::serve(listener, app).await?;

  Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
  if origins.is_empty() || origins.iter().any(|o| o == "*") {
    return CorsLayer::permissive();
  }
  let allowed: Vec<HeaderValue> = origins
    .iter()
    .filter_map(|o| match HeaderValue::from_str(o) {
      Ok(v) => Some(v),
      Err(_) => {
        tracing::warn!(origin = %o, "ignoring invalid CORS origin");
        None
      }
    })
    .collect();
  CorsLayer::new()
    .allow_origin(AllowOrigin::list(allowed))
    .allow_methods(Any)
    .allow_headers(Any)
}
