//! Core types for the incident platform (JSON contracts + internal models).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract — what the caller sends)
// ---------------------------------------------------------------------------

/// A citizen-submitted report. Unknown fields are silently ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundReport {
  #[serde(rename = "type")]
  pub incident_type: String,
  pub description: String,
  pub latitude: f64,
  pub longitude: f64,
  #[serde(default)]
  pub media_url: Option<String>,
  #[serde(default)]
  pub severity: Option<String>,
}

/// A responder/admin update. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundPatch {
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub severity: Option<String>,
  #[serde(default)]
  pub is_verified: Option<bool>,
  #[serde(default)]
  pub note: Option<String>,
  #[serde(default)]
  pub author: Option<String>,
}

// ---------------------------------------------------------------------------
// Severity / status enums (normalized)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Low,
  #[default]
  Medium,
  High,
}

impl Severity {
  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "low" => Some(Self::Low),
      "medium" | "med" => Some(Self::Medium),
      "high" => Some(Self::High),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Low => "low",
      Self::Medium => "medium",
      Self::High => "high",
    }
  }
}

/// Workflow position. Forward order is `Reported -> InProgress -> Resolved`,
/// but any transition is accepted (admin correction may reopen).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
  #[default]
  Reported,
  InProgress,
  Resolved,
}

impl Status {
  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "reported" => Some(Self::Reported),
      "in_progress" | "in-progress" | "inprogress" => Some(Self::InProgress),
      "resolved" => Some(Self::Resolved),
      _ => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Reported => "reported",
      Self::InProgress => "in_progress",
      Self::Resolved => "resolved",
    }
  }
}

// ---------------------------------------------------------------------------
// Internal normalized types
// ---------------------------------------------------------------------------

/// A validated report, ready for duplicate matching and creation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
  pub incident_type: String,
  pub description: String,
  pub latitude: f64,
  pub longitude: f64,
  pub media_url: Option<String>,
  pub severity: Severity,
}

/// A validated partial update. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentPatch {
  pub status: Option<Status>,
  pub severity: Option<Severity>,
  pub is_verified: Option<bool>,
  pub note: Option<String>,
  pub author: Option<String>,
}

/// The slice of a committed incident the duplicate matcher needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentReport {
  pub id: Uuid,
  pub latitude: f64,
  pub longitude: f64,
  pub created_at: DateTime<Utc>,
}

/// Listing filter. The store applies `incident_type` and `since`; the radius
/// filter applies only when origin and radius are all present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentFilter {
  pub incident_type: Option<String>,
  pub since: Option<DateTime<Utc>>,
  pub origin_lat: Option<f64>,
  pub origin_lng: Option<f64>,
  pub radius_m: Option<f64>,
}

// ---------------------------------------------------------------------------
// Incident record
// ---------------------------------------------------------------------------

/// Append-only annotation owned by exactly one incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentNote {
  pub id: Uuid,
  #[serde(rename = "note")]
  pub body: String,
  pub author: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
  pub id: Uuid,
  #[serde(rename = "type")]
  pub incident_type: String,
  pub description: String,
  pub latitude: f64,
  pub longitude: f64,
  pub media_url: Option<String>,
  pub severity: Severity,
  pub status: Status,
  pub is_verified: bool,
  pub possible_duplicate_of: Option<Uuid>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[serde(default)]
  pub notes: Vec<IncidentNote>,
}

impl Incident {
  pub fn as_recent(&self) -> RecentReport {
    RecentReport {
      id: self.id,
      latitude: self.latitude,
      longitude: self.longitude,
      created_at: self.created_at,
    }
  }
}

// ---------------------------------------------------------------------------
// Lifecycle events (what observers receive)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
  #[serde(rename = "incident_created")]
  Created,
  #[serde(rename = "incident_updated")]
  Updated,
}

/// One transition plus the incident as it was committed.
///
/// Wire shape: `{"event": "incident_created", "data": {...incident}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
  #[serde(rename = "event")]
  pub kind: EventKind,
  #[serde(rename = "data")]
  pub incident: Incident,
}

impl LifecycleEvent {
  pub fn created(incident: &Incident) -> Self {
    Self {
      kind: EventKind::Created,
      incident: incident.clone(),
    }
  }

  pub fn updated(incident: &Incident) -> Self {
    Self {
      kind: EventKind::Updated,
      incident: incident.clone(),
    }
  }
}

// ---------------------------------------------------------------------------
// Error wrapper
// ---------------------------------------------------------------------------

/// Structured error output for invalid input (replay lines, HTTP bodies).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn severity_parses_loosely() {
    assert_eq!(Severity::from_str_loose(" HIGH "), Some(Severity::High));
    assert_eq!(Severity::from_str_loose("med"), Some(Severity::Medium));
    assert_eq!(Severity::from_str_loose("urgent"), None);
  }

  #[test]
  fn status_wire_names() {
    assert_eq!(serde_json::to_string(&Status::InProgress).unwrap(), "\"in_progress\"");
    assert_eq!(Status::from_str_loose("in-progress"), Some(Status::InProgress));
    assert_eq!(Status::Resolved.as_str(), "resolved");
  }

  #[test]
  fn lifecycle_event_wire_shape() {
    let now = Utc::now();
    let incident = Incident {
      id: Uuid::new_v4(),
      incident_type: "fire".into(),
      description: "smoke from roof".into(),
      latitude: 10.0,
      longitude: 20.0,
      media_url: None,
      severity: Severity::High,
      status: Status::Reported,
      is_verified: false,
      possible_duplicate_of: None,
      created_at: now,
      updated_at: now,
      notes: vec![],
    };
    let value = serde_json::to_value(LifecycleEvent::created(&incident)).unwrap();
    assert_eq!(value["event"], "incident_created");
    assert_eq!(value["data"]["type"], "fire");
    assert_eq!(value["data"]["status"], "reported");
    assert_eq!(value["data"]["severity"], "high");
    assert!(value["data"]["possible_duplicate_of"].is_null());
    assert!(value["data"]["media_url"].is_null());
  }
}
