//! Validate inbound reports and patches into canonical internal models.

use crate::error::EngineError;
use crate::types::*;

const MAX_TYPE_LEN: usize = 50;
const MAX_AUTHOR_LEN: usize = 80;

/// Parse and validate an InboundReport.
pub fn normalize_report(raw: &InboundReport) -> Result<NewReport, EngineError> {
  let incident_type = raw.incident_type.trim();
  if incident_type.is_empty() {
    return Err(EngineError::validation("type", "must not be empty"));
  }
  if incident_type.chars().count() > MAX_TYPE_LEN {
    return Err(EngineError::validation("type", "must be at most 50 characters"));
  }

  let description = raw.description.trim();
  if description.is_empty() {
    return Err(EngineError::validation("description", "must not be empty"));
  }

  if !raw.latitude.is_finite() || !(-90.0..=90.0).contains(&raw.latitude) {
    return Err(EngineError::validation("latitude", "expected -90..=90"));
  }
  if !raw.longitude.is_finite() || !(-180.0..=180.0).contains(&raw.longitude) {
    return Err(EngineError::validation("longitude", "expected -180..=180"));
  }

  let severity = match raw.severity.as_deref().map(str::trim) {
    None | Some("") => Severity::default(),
    Some(s) => Severity::from_str_loose(s)
      .ok_or_else(|| EngineError::validation("severity", "expected low|medium|high"))?,
  };

  Ok(NewReport {
    incident_type: incident_type.to_string(),
    description: description.to_string(),
    latitude: raw.latitude,
    longitude: raw.longitude,
    media_url: non_blank(raw.media_url.as_deref()),
    severity,
  })
}

/// Parse and validate an InboundPatch.
pub fn normalize_patch(raw: &InboundPatch) -> Result<IncidentPatch, EngineError> {
  let status = match raw.status.as_deref() {
    Some(s) => Some(
      Status::from_str_loose(s)
        .ok_or_else(|| EngineError::validation("status", "expected reported|in_progress|resolved"))?,
    ),
    None => None,
  };

  let severity = match raw.severity.as_deref() {
    Some(s) => Some(
      Severity::from_str_loose(s)
        .ok_or_else(|| EngineError::validation("severity", "expected low|medium|high"))?,
    ),
    None => None,
  };

  let author = non_blank(raw.author.as_deref());
  if let Some(a) = &author {
    if a.chars().count() > MAX_AUTHOR_LEN {
      return Err(EngineError::validation("author", "must be at most 80 characters"));
    }
  }

  Ok(IncidentPatch {
    status,
    severity,
    is_verified: raw.is_verified,
    note: non_blank(raw.note.as_deref()),
    author,
  })
}

/// Trim; blank becomes None.
fn non_blank(s: Option<&str>) -> Option<String> {
  s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn raw_report() -> InboundReport {
    InboundReport {
      incident_type: " fire ".into(),
      description: "smoke near the bridge".into(),
      latitude: 10.0,
      longitude: 20.0,
      media_url: Some("   ".into()),
      severity: None,
    }
  }

  #[test]
  fn normalize_valid_report() {
    let report = normalize_report(&raw_report()).unwrap();
    assert_eq!(report.incident_type, "fire");
    assert_eq!(report.severity, Severity::Medium);
    assert!(report.media_url.is_none());
  }

  #[test]
  fn normalize_rejects_empty_type() {
    let mut raw = raw_report();
    raw.incident_type = "  ".into();
    let err = normalize_report(&raw).unwrap_err();
    assert!(err.to_string().contains("type"));
  }

  #[test]
  fn normalize_rejects_out_of_range_coordinates() {
    let mut raw = raw_report();
    raw.latitude = 91.0;
    assert!(normalize_report(&raw).unwrap_err().to_string().contains("latitude"));

    let mut raw = raw_report();
    raw.longitude = f64::NAN;
    assert!(normalize_report(&raw).unwrap_err().to_string().contains("longitude"));
  }

  #[test]
  fn normalize_accepts_boundary_coordinates() {
    let mut raw = raw_report();
    raw.latitude = -90.0;
    raw.longitude = 180.0;
    assert!(normalize_report(&raw).is_ok());
  }

  #[test]
  fn normalize_rejects_unknown_severity() {
    let mut raw = raw_report();
    raw.severity = Some("catastrophic".into());
    assert!(normalize_report(&raw).unwrap_err().to_string().contains("severity"));
  }

  #[test]
  fn patch_parses_status_and_blanks() {
    let raw = InboundPatch {
      status: Some("in-progress".into()),
      note: Some("  ".into()),
      author: Some("responder".into()),
      ..InboundPatch::default()
    };
    let patch = normalize_patch(&raw).unwrap();
    assert_eq!(patch.status, Some(Status::InProgress));
    assert!(patch.note.is_none());
    assert_eq!(patch.author.as_deref(), Some("responder"));
  }

  #[test]
  fn patch_rejects_unknown_status() {
    let raw = InboundPatch {
      status: Some("closed".into()),
      ..InboundPatch::default()
    };
    let err = normalize_patch(&raw).unwrap_err();
    assert!(err.to_string().contains("status"));
  }
}
