//! Incident lifecycle: creation defaults and patch application.
//!
//! Status is written unconditionally. `Resolved` is not terminal; admins
//! reopen incidents by patching status back to `Reported` or `InProgress`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::{Incident, IncidentNote, IncidentPatch, NewReport, Status};

/// What `apply_update` actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
  /// At least one attribute took a new value.
  pub fields_changed: bool,
  /// Id of the note appended by this patch, if any.
  pub note_added: Option<Uuid>,
}

impl UpdateOutcome {
  pub fn is_noop(&self) -> bool {
    !self.fields_changed && self.note_added.is_none()
  }
}

/// Build a fresh incident in the `Reported` state.
///
/// `possible_duplicate_of` is fixed here and never touched again.
pub fn create(report: NewReport, possible_duplicate_of: Option<Uuid>, now: DateTime<Utc>) -> Incident {
  let id = Uuid::new_v4();
  Incident {
    id,
    incident_type: report.incident_type,
    description: report.description,
    latitude: report.latitude,
    longitude: report.longitude,
    media_url: report.media_url,
    severity: report.severity,
    status: Status::Reported,
    is_verified: false,
    possible_duplicate_of: possible_duplicate_of.filter(|dup| *dup != id),
    created_at: now,
    updated_at: now,
    notes: Vec::new(),
  }
}

/// Apply a patch in place.
///
/// Present fields overwrite; a note is appended only when both body and
/// author are present. `updated_at` moves to `now` (never backwards) when
/// anything changed.
pub fn apply_update(incident: &mut Incident, patch: &IncidentPatch, now: DateTime<Utc>) -> UpdateOutcome {
  let mut outcome = UpdateOutcome::default();

  if let Some(status) = patch.status {
    if incident.status != status {
      incident.status = status;
      outcome.fields_changed = true;
    }
  }
  if let Some(severity) = patch.severity {
    if incident.severity != severity {
      incident.severity = severity;
      outcome.fields_changed = true;
    }
  }
  if let Some(is_verified) = patch.is_verified {
    if incident.is_verified != is_verified {
      incident.is_verified = is_verified;
      outcome.fields_changed = true;
    }
  }

  if let (Some(body), Some(author)) = (&patch.note, &patch.author) {
    let note = IncidentNote {
      id: Uuid::new_v4(),
      body: body.clone(),
      author: author.clone(),
      created_at: now,
    };
    outcome.note_added = Some(note.id);
    incident.notes.push(note);
  }

  if !outcome.is_noop() {
    incident.updated_at = incident.updated_at.max(now);
  }
  outcome
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::Severity;
  use chrono::{Duration, TimeZone};

  fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap()
  }

  fn report() -> NewReport {
    NewReport {
      incident_type: "fire".into(),
      description: "smoke over the market".into(),
      latitude: 10.0,
      longitude: 20.0,
      media_url: None,
      severity: Severity::High,
    }
  }

  #[test]
  fn create_starts_reported_and_unverified() {
    let incident = create(report(), None, t0());
    assert_eq!(incident.status, Status::Reported);
    assert!(!incident.is_verified);
    assert_eq!(incident.severity, Severity::High);
    assert_eq!(incident.created_at, incident.updated_at);
    assert!(incident.possible_duplicate_of.is_none());
    assert!(incident.notes.is_empty());
  }

  #[test]
  fn create_keeps_duplicate_link() {
    let prior = Uuid::new_v4();
    let incident = create(report(), Some(prior), t0());
    assert_eq!(incident.possible_duplicate_of, Some(prior));
    assert_ne!(incident.possible_duplicate_of, Some(incident.id));
  }

  #[test]
  fn verify_only_touches_flag_and_timestamp() {
    let mut incident = create(report(), None, t0());
    let later = t0() + Duration::seconds(30);
    let patch = IncidentPatch {
      is_verified: Some(true),
      ..IncidentPatch::default()
    };
    let outcome = apply_update(&mut incident, &patch, later);

    assert!(outcome.fields_changed);
    assert!(incident.is_verified);
    assert_eq!(incident.status, Status::Reported);
    assert_eq!(incident.severity, Severity::High);
    assert_eq!(incident.updated_at, later);
    assert!(incident.updated_at > incident.created_at);
  }

  #[test]
  fn note_without_author_is_ignored() {
    let mut incident = create(report(), None, t0());
    let patch = IncidentPatch {
      note: Some("crew on site".into()),
      ..IncidentPatch::default()
    };
    let outcome = apply_update(&mut incident, &patch, t0() + Duration::seconds(5));
    assert!(incident.notes.is_empty());
    assert!(outcome.is_noop());
    assert_eq!(incident.updated_at, t0());
  }

  #[test]
  fn author_without_note_is_ignored() {
    let mut incident = create(report(), None, t0());
    let patch = IncidentPatch {
      author: Some("responder-7".into()),
      ..IncidentPatch::default()
    };
    apply_update(&mut incident, &patch, t0() + Duration::seconds(5));
    assert!(incident.notes.is_empty());
  }

  #[test]
  fn full_note_is_appended_in_order() {
    let mut incident = create(report(), None, t0());
    for (i, body) in ["dispatched", "on scene"].iter().enumerate() {
      let patch = IncidentPatch {
        note: Some((*body).into()),
        author: Some("responder-7".into()),
        ..IncidentPatch::default()
      };
      let outcome = apply_update(&mut incident, &patch, t0() + Duration::minutes(i as i64 + 1));
      assert!(outcome.note_added.is_some());
    }
    let bodies: Vec<_> = incident.notes.iter().map(|n| n.body.as_str()).collect();
    assert_eq!(bodies, vec!["dispatched", "on scene"]);
    assert_eq!(incident.updated_at, t0() + Duration::minutes(2));
  }

  #[test]
  fn resolved_can_be_reopened() {
    let mut incident = create(report(), None, t0());
    let resolve = IncidentPatch {
      status: Some(Status::Resolved),
      ..IncidentPatch::default()
    };
    apply_update(&mut incident, &resolve, t0() + Duration::minutes(1));
    assert_eq!(incident.status, Status::Resolved);

    let reopen = IncidentPatch {
      status: Some(Status::InProgress),
      ..IncidentPatch::default()
    };
    let outcome = apply_update(&mut incident, &reopen, t0() + Duration::minutes(2));
    assert!(outcome.fields_changed);
    assert_eq!(incident.status, Status::InProgress);
  }

  #[test]
  fn updated_at_never_moves_backwards() {
    let mut incident = create(report(), None, t0());
    let patch = IncidentPatch {
      severity: Some(Severity::Low),
      ..IncidentPatch::default()
    };
    apply_update(&mut incident, &patch, t0() - Duration::seconds(10));
    assert_eq!(incident.severity, Severity::Low);
    assert_eq!(incident.updated_at, t0());
  }

  #[test]
  fn duplicate_link_survives_updates() {
    let prior = Uuid::new_v4();
    let mut incident = create(report(), Some(prior), t0());
    let patch = IncidentPatch {
      status: Some(Status::Resolved),
      severity: Some(Severity::Low),
      is_verified: Some(true),
      note: Some("merged manually".into()),
      author: Some("admin".into()),
    };
    apply_update(&mut incident, &patch, t0() + Duration::minutes(3));
    assert_eq!(incident.possible_duplicate_of, Some(prior));
  }
}
