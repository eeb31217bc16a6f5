//! Storage port consumed by the service, plus an in-memory implementation.

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::types::{Incident, IncidentFilter, RecentReport};

/// Durable incident storage. Reads reflect committed state only.
pub trait IncidentStore: Send + Sync {
  /// Same-type reports created at or after `since`, newest first.
  fn recent_reports_of_type(
    &self,
    incident_type: &str,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<RecentReport>, StoreError>> + Send;

  /// Commit a newly created incident.
  fn insert(&self, incident: &Incident) -> impl Future<Output = Result<(), StoreError>> + Send;

  /// Atomic read-modify-write of one incident.
  ///
  /// `apply` runs while the row is locked against concurrent updates; its
  /// changes (including appended notes) are committed before this resolves.
  /// `None` when the id is unknown.
  fn update<F, T>(
    &self,
    id: Uuid,
    apply: F,
  ) -> impl Future<Output = Result<Option<(Incident, T)>, StoreError>> + Send
  where
    F: FnOnce(&mut Incident) -> T + Send,
    T: Send;

  /// One incident with its notes (oldest first).
  fn get(&self, id: Uuid) -> impl Future<Output = Result<Option<Incident>, StoreError>> + Send;

  /// Incidents matching `filter.incident_type` and `filter.since`, newest first.
  fn list(&self, filter: &IncidentFilter) -> impl Future<Output = Result<Vec<Incident>, StoreError>> + Send;
}

/// Process-local store. Used by tests and the replay binary.
#[derive(Debug, Default)]
pub struct MemoryStore {
  rows: RwLock<HashMap<Uuid, Incident>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn len(&self) -> usize {
    self.rows.read().await.len()
  }
}

fn newest_first(rows: &mut [Incident]) {
  rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

impl IncidentStore for MemoryStore {
  async fn recent_reports_of_type(
    &self,
    incident_type: &str,
    since: DateTime<Utc>,
  ) -> Result<Vec<RecentReport>, StoreError> {
    let rows = self.rows.read().await;
    let mut matching: Vec<Incident> = rows
      .values()
      .filter(|i| i.incident_type == incident_type && i.created_at >= since)
      .cloned()
      .collect();
    newest_first(&mut matching);
    Ok(matching.iter().map(Incident::as_recent).collect())
  }

  async fn insert(&self, incident: &Incident) -> Result<(), StoreError> {
    let mut rows = self.rows.write().await;
    if rows.contains_key(&incident.id) {
      return Err(StoreError::Conflict(format!("incident {} already exists", incident.id)));
    }
    rows.insert(incident.id, incident.clone());
    Ok(())
  }

  async fn update<F, T>(&self, id: Uuid, apply: F) -> Result<Option<(Incident, T)>, StoreError>
  where
    F: FnOnce(&mut Incident) -> T + Send,
    T: Send,
  {
    let mut rows = self.rows.write().await;
    Ok(rows.get_mut(&id).map(|row| {
      let out = apply(row);
      (row.clone(), out)
    }))
  }

  async fn get(&self, id: Uuid) -> Result<Option<Incident>, StoreError> {
    Ok(self.rows.read().await.get(&id).cloned())
  }

  async fn list(&self, filter: &IncidentFilter) -> Result<Vec<Incident>, StoreError> {
    let rows = self.rows.read().await;
    let mut matching: Vec<Incident> = rows
      .values()
      .filter(|i| {
        filter
          .incident_type
          .as_deref()
          .map_or(true, |t| i.incident_type == t)
      })
      .filter(|i| filter.since.map_or(true, |since| i.created_at >= since))
      .cloned()
      .collect();
    newest_first(&mut matching);
    Ok(matching)
  }
}
