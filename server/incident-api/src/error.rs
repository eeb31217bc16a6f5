//! Error types for the API service and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use incident_core::types::ErrorOutput;
use incident_core::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config: {0} must be set")]
  Missing(&'static str),

  #[error("config: {key}: {reason}")]
  Invalid { key: &'static str, reason: String },
}

impl ConfigError {
  pub fn invalid(key: &'static str, reason: &str) -> Self {
    Self::Invalid {
      key,
      reason: reason.to_string(),
    }
  }
}

/// Handler error; rendered as `ErrorOutput` JSON.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Engine(#[from] EngineError),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::Engine(EngineError::Validation { field, reason }) => (
        StatusCode::BAD_REQUEST,
        ErrorOutput::new(reason.clone()).with_field(field.clone()),
      ),
      ApiError::Engine(EngineError::NotFound(_)) => (StatusCode::NOT_FOUND, ErrorOutput::new("Incident not found")),
      ApiError::Engine(EngineError::Store(e)) => {
        tracing::error!("store error: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, ErrorOutput::new("internal storage error"))
      }
    };
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use incident_core::StoreError;
  use uuid::Uuid;

  #[test]
  fn status_mapping() {
    let cases = [
      (EngineError::validation("latitude", "expected -90..=90"), StatusCode::BAD_REQUEST),
      (EngineError::NotFound(Uuid::new_v4()), StatusCode::NOT_FOUND),
      (EngineError::Store(StoreError::backend("down")), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, expected) in cases {
      assert_eq!(ApiError::from(err).into_response().status(), expected);
    }
  }
}
