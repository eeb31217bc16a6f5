//! Structured error types for the incident core.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("incident not found: {0}")]
  NotFound(Uuid),

  #[error("store: {0}")]
  Store(#[from] StoreError),
}

impl EngineError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }
}

/// Failures reported by an `IncidentStore` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("backend: {0}")]
  Backend(String),

  #[error("conflict: {0}")]
  Conflict(String),
}

impl StoreError {
  pub fn backend(msg: impl Into<String>) -> Self {
    Self::Backend(msg.into())
  }
}

/// Why a single observer could not take an event. Never escapes `publish`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
  #[error("observer queue full")]
  Lagging,

  #[error("observer closed")]
  Closed,

  #[error("encode: {0}")]
  Encode(String),
}
