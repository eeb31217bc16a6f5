//! HTTP handlers for the incident API.

use axum::{
  extract::{Path, Query, State},
  Json,
};
use chrono::Utc;
use incident_core::{InboundPatch, InboundReport, Incident, IncidentStore};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use crate::types::ListQuery;

pub async fn health() -> &'static str {
  "ok"
}

pub async fn create_incident<S: IncidentStore>(
  State(state): State<Arc<AppState<S>>>,
  Json(payload): Json<InboundReport>,
) -> Result<Json<Incident>, ApiError> {
  let incident = state.service.create(&payload).await?;
  Ok(Json(incident))
}

pub async fn list_incidents<S: IncidentStore>(
  State(state): State<Arc<AppState<S>>>,
  Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Incident>>, ApiError> {
  let filter = query.into_filter(Utc::now());
  let incidents = state.service.list(&filter).await?;
  Ok(Json(incidents))
}

pub async fn get_incident<S: IncidentStore>(
  State(state): State<Arc<AppState<S>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Incident>, ApiError> {
  let incident = state.service.get(id).await?;
  Ok(Json(incident))
}

pub async fn update_incident<S: IncidentStore>(
  State(state): State<Arc<AppState<S>>>,
  Path(id): Path<Uuid>,
  Json(payload): Json<InboundPatch>,
) -> Result<Json<Incident>, ApiError> {
  let incident = state.service.update(id, &payload).await?;
  Ok(Json(incident))
}
