//! PostgreSQL-backed `IncidentStore`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use incident_core::types::RecentReport;
use incident_core::{Incident, IncidentFilter, IncidentNote, IncidentStore, Severity, Status, StoreError};
use sqlx_core::query::query;
use sqlx_core::row::Row;
use sqlx_postgres::{PgPool, PgRow};
use uuid::Uuid;

const SCHEMA: &[&str] = &[
  r#"
  CREATE TABLE IF NOT EXISTS incidents (
    id UUID PRIMARY KEY,
    type VARCHAR(50) NOT NULL,
    description TEXT NOT NULL,
    latitude DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    media_url TEXT,
    severity TEXT NOT NULL,
    status TEXT NOT NULL,
    is_verified BOOLEAN NOT NULL DEFAULT FALSE,
    possible_duplicate_of UUID REFERENCES incidents(id),
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
  )
  "#,
  "CREATE INDEX IF NOT EXISTS incidents_type_created_at ON incidents (type, created_at DESC)",
  r#"
  CREATE TABLE IF NOT EXISTS incident_notes (
    id UUID PRIMARY KEY,
    incident_id UUID NOT NULL REFERENCES incidents(id) ON DELETE CASCADE,
    note TEXT NOT NULL,
    author VARCHAR(80) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
  )
  "#,
  "CREATE INDEX IF NOT EXISTS incident_notes_incident ON incident_notes (incident_id, created_at)",
];

const INCIDENT_COLUMNS: &str = "id, type, description, latitude, longitude, media_url, severity, status, \
   is_verified, possible_duplicate_of, created_at, updated_at";

pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str) -> Result<Self, sqlx_core::Error> {
    let pool = PgPool::connect(database_url).await?;
    Ok(Self::new(pool))
  }

  /// Create tables and indexes if absent.
  pub async fn migrate(&self) -> Result<(), sqlx_core::Error> {
    for stmt in SCHEMA {
      query(stmt).execute(&self.pool).await?;
    }
    Ok(())
  }

  async fn notes_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<IncidentNote>>, StoreError> {
    let mut by_incident: HashMap<Uuid, Vec<IncidentNote>> = HashMap::new();
    if ids.is_empty() {
      return Ok(by_incident);
    }
    let rows = query(
      "SELECT id, incident_id, note, author, created_at FROM incident_notes \
       WHERE incident_id = ANY($1) ORDER BY created_at ASC, id ASC",
    )
    .bind(ids.to_vec())
    .fetch_all(&self.pool)
    .await
    .map_err(backend)?;

    for row in &rows {
      let incident_id: Uuid = row.try_get("incident_id").map_err(backend)?;
      by_incident.entry(incident_id).or_default().push(note_from_row(row)?);
    }
    Ok(by_incident)
  }

  async fn with_notes(&self, mut incidents: Vec<Incident>) -> Result<Vec<Incident>, StoreError> {
    let ids: Vec<Uuid> = incidents.iter().map(|i| i.id).collect();
    let mut notes = self.notes_for(&ids).await?;
    for incident in &mut incidents {
      incident.notes = notes.remove(&incident.id).unwrap_or_default();
    }
    Ok(incidents)
  }
}

fn backend(e: sqlx_core::Error) -> StoreError {
  StoreError::backend(e.to_string())
}

fn note_from_row(row: &PgRow) -> Result<IncidentNote, StoreError> {
  Ok(IncidentNote {
    id: row.try_get("id").map_err(backend)?,
    body: row.try_get("note").map_err(backend)?,
    author: row.try_get("author").map_err(backend)?,
    created_at: row.try_get("created_at").map_err(backend)?,
  })
}

fn incident_from_row(row: &PgRow) -> Result<Incident, StoreError> {
  let severity: String = row.try_get("severity").map_err(backend)?;
  let status: String = row.try_get("status").map_err(backend)?;
  Ok(Incident {
    id: row.try_get("id").map_err(backend)?,
    incident_type: row.try_get("type").map_err(backend)?,
    description: row.try_get("description").map_err(backend)?,
    latitude: row.try_get("latitude").map_err(backend)?,
    longitude: row.try_get("longitude").map_err(backend)?,
    media_url: row.try_get("media_url").map_err(backend)?,
    severity: Severity::from_str_loose(&severity)
      .ok_or_else(|| StoreError::backend(format!("unknown severity {:?}", severity)))?,
    status: Status::from_str_loose(&status)
      .ok_or_else(|| StoreError::backend(format!("unknown status {:?}", status)))?,
    is_verified: row.try_get("is_verified").map_err(backend)?,
    possible_duplicate_of: row.try_get("possible_duplicate_of").map_err(backend)?,
    created_at: row.try_get("created_at").map_err(backend)?,
    updated_at: row.try_get("updated_at").map_err(backend)?,
    notes: Vec::new(),
  })
}

impl IncidentStore for PgStore {
  async fn recent_reports_of_type(
    &self,
    incident_type: &str,
    since: DateTime<Utc>,
  ) -> Result<Vec<RecentReport>, StoreError> {
    let rows = query(
      "SELECT id, latitude, longitude, created_at FROM incidents \
       WHERE type = $1 AND created_at >= $2 ORDER BY created_at DESC",
    )
    .bind(incident_type)
    .bind(since)
    .fetch_all(&self.pool)
    .await
    .map_err(backend)?;

    rows
      .iter()
      .map(|row| {
        Ok(RecentReport {
          id: row.try_get("id").map_err(backend)?,
          latitude: row.try_get("latitude").map_err(backend)?,
          longitude: row.try_get("longitude").map_err(backend)?,
          created_at: row.try_get("created_at").map_err(backend)?,
        })
      })
      .collect()
  }

  async fn insert(&self, incident: &Incident) -> Result<(), StoreError> {
    query(
      r#"
      INSERT INTO incidents (id, type, description, latitude, longitude, media_url, severity, status,
                             is_verified, possible_duplicate_of, created_at, updated_at)
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
      "#,
    )
    .bind(incident.id)
    .bind(&incident.incident_type)
    .bind(&incident.description)
    .bind(incident.latitude)
    .bind(incident.longitude)
    .bind(&incident.media_url)
    .bind(incident.severity.as_str())
    .bind(incident.status.as_str())
    .bind(incident.is_verified)
    .bind(incident.possible_duplicate_of)
    .bind(incident.created_at)
    .bind(incident.updated_at)
    .execute(&self.pool)
    .await
    .map_err(backend)?;
    Ok(())
  }

  /// Row-locked read-modify-write: the incident is selected `FOR UPDATE`,
  /// patched, written back and any new notes appended in one transaction.
  async fn update<F, T>(&self, id: Uuid, apply: F) -> Result<Option<(Incident, T)>, StoreError>
  where
    F: FnOnce(&mut Incident) -> T + Send,
    T: Send,
  {
    let mut tx = self.pool.begin().await.map_err(backend)?;

    let sql = format!("SELECT {} FROM incidents WHERE id = $1 FOR UPDATE", INCIDENT_COLUMNS);
    let row = query(&sql)
      .bind(id)
      .fetch_optional(&mut *tx)
      .await
      .map_err(backend)?;
    let Some(row) = row else {
      return Ok(None);
    };
    let mut incident = incident_from_row(&row)?;

    let note_rows = query(
      "SELECT id, incident_id, note, author, created_at FROM incident_notes \
       WHERE incident_id = $1 ORDER BY created_at ASC, id ASC",
    )
    .bind(id)
    .fetch_all(&mut *tx)
    .await
    .map_err(backend)?;
    incident.notes = note_rows.iter().map(note_from_row).collect::<Result<Vec<_>, _>>()?;
    let stored_notes = incident.notes.len();

    let out = apply(&mut incident);

    let updated = query(
      r#"
      UPDATE incidents
      SET severity = $2, status = $3, is_verified = $4, updated_at = GREATEST(updated_at, $5)
      WHERE id = $1
      RETURNING updated_at
      "#,
    )
    .bind(incident.id)
    .bind(incident.severity.as_str())
    .bind(incident.status.as_str())
    .bind(incident.is_verified)
    .bind(incident.updated_at)
    .fetch_one(&mut *tx)
    .await
    .map_err(backend)?;
    incident.updated_at = updated.try_get("updated_at").map_err(backend)?;

    for note in &incident.notes[stored_notes..] {
      query(
        r#"
        INSERT INTO incident_notes (id, incident_id, note, author, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
      )
      .bind(note.id)
      .bind(incident.id)
      .bind(&note.body)
      .bind(&note.author)
      .bind(note.created_at)
      .execute(&mut *tx)
      .await
      .map_err(backend)?;
    }

    tx.commit().await.map_err(backend)?;
    Ok(Some((incident, out)))
  }

  async fn get(&self, id: Uuid) -> Result<Option<Incident>, StoreError> {
    let sql = format!("SELECT {} FROM incidents WHERE id = $1", INCIDENT_COLUMNS);
    let row = query(&sql)
      .bind(id)
      .fetch_optional(&self.pool)
      .await
      .map_err(backend)?;

    match row {
      Some(row) => {
        let incident = incident_from_row(&row)?;
        Ok(self.with_notes(vec![incident]).await?.pop())
      }
      None => Ok(None),
    }
  }

  async fn list(&self, filter: &IncidentFilter) -> Result<Vec<Incident>, StoreError> {
    let sql = format!(
      "SELECT {} FROM incidents \
       WHERE ($1::text IS NULL OR type = $1) AND ($2::timestamptz IS NULL OR created_at >= $2) \
       ORDER BY created_at DESC",
      INCIDENT_COLUMNS
    );
    let rows = query(&sql)
      .bind(filter.incident_type.as_deref())
      .bind(filter.since)
      .fetch_all(&self.pool)
      .await
      .map_err(backend)?;

    let incidents = rows.iter().map(incident_from_row).collect::<Result<Vec<_>, _>>()?;
    self.with_notes(incidents).await
  }
}
