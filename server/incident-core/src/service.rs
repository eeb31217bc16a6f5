//! Incident service: validation -> dedupe -> lifecycle -> commit -> fan-out.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::broadcast::Broadcaster;
use crate::config::Config;
use crate::dedupe::DuplicateMatcher;
use crate::error::EngineError;
use crate::geo;
use crate::lifecycle;
use crate::normalize;
use crate::store::IncidentStore;
use crate::types::*;

/// Wires the core to a store and a broadcaster. One instance per process.
pub struct IncidentService<S> {
  config: Config,
  matcher: DuplicateMatcher,
  store: S,
  broadcaster: Arc<Broadcaster>,
}

impl<S: IncidentStore> IncidentService<S> {
  pub fn new(config: Config, store: S, broadcaster: Arc<Broadcaster>) -> Self {
    Self {
      matcher: DuplicateMatcher::from_config(&config),
      config,
      store,
      broadcaster,
    }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  pub fn broadcaster(&self) -> &Arc<Broadcaster> {
    &self.broadcaster
  }

  /// Create an incident and broadcast `incident_created`.
  ///
  /// Duplicate lookup never blocks creation: a failed recent-reports query
  /// is logged and the incident is created without a link.
  pub async fn create(&self, raw: &InboundReport) -> Result<Incident, EngineError> {
    let report = normalize::normalize_report(raw)?;
    let now = Utc::now();

    let duplicate = match self
      .store
      .recent_reports_of_type(&report.incident_type, self.matcher.window_start(now))
      .await
    {
      Ok(recent) => self.matcher.find_duplicate(
        &report.incident_type,
        report.latitude,
        report.longitude,
        &recent,
      ),
      Err(e) => {
        tracing::warn!(
          incident_type = %report.incident_type,
          "duplicate lookup failed, creating without link: {}",
          e
        );
        None
      }
    };

    let incident = lifecycle::create(report, duplicate.map(|m| m.id), now);
    self.store.insert(&incident).await?;

    tracing::info!(
      incident_id = %incident.id,
      incident_type = %incident.incident_type,
      possible_duplicate_of = ?incident.possible_duplicate_of,
      distance_m = ?duplicate.map(|m| m.distance_m.round()),
      "incident created"
    );
    self.broadcaster.publish(&LifecycleEvent::created(&incident)).await;
    Ok(incident)
  }

  /// Apply a patch and broadcast `incident_updated`.
  ///
  /// The patch is applied inside the store's locked update, so concurrent
  /// updates to one incident never lose each other's notes.
  pub async fn update(&self, id: Uuid, raw: &InboundPatch) -> Result<Incident, EngineError> {
    let patch = normalize::normalize_patch(raw)?;
    let (incident, outcome) = self
      .store
      .update(id, |incident| lifecycle::apply_update(incident, &patch, Utc::now()))
      .await?
      .ok_or(EngineError::NotFound(id))?;

    tracing::info!(
      incident_id = %incident.id,
      status = incident.status.as_str(),
      severity = incident.severity.as_str(),
      is_verified = incident.is_verified,
      changed = outcome.fields_changed,
      note_added = outcome.note_added.is_some(),
      "incident updated"
    );
    self.broadcaster.publish(&LifecycleEvent::updated(&incident)).await;
    Ok(incident)
  }

  pub async fn get(&self, id: Uuid) -> Result<Incident, EngineError> {
    self.store.get(id).await?.ok_or(EngineError::NotFound(id))
  }

  /// List incidents, applying the radius filter in process.
  pub async fn list(&self, filter: &IncidentFilter) -> Result<Vec<Incident>, EngineError> {
    let rows = self.store.list(filter).await?;
    let origin = match (filter.origin_lat, filter.origin_lng, filter.radius_m) {
      (Some(lat), Some(lng), Some(radius)) => Some((lat, lng, radius)),
      _ => None,
    };
    let Some((lat, lng, radius)) = origin else {
      return Ok(rows);
    };
    Ok(
      rows
        .into_iter()
        .filter(|i| geo::distance_m(lat, lng, i.latitude, i.longitude) <= radius)
        .collect(),
    )
  }
}
