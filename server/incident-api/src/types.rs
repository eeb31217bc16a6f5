//! Request types for the incident API.

use chrono::{DateTime, Utc};
use incident_core::IncidentFilter;
use serde::Deserialize;

use crate::date;

/// Query string of `GET /incidents`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
  #[serde(rename = "type")]
  pub incident_type: Option<String>,
  pub origin_lat: Option<f64>,
  pub origin_lng: Option<f64>,
  pub radius_m: Option<f64>,
  pub since_minutes: Option<i64>,
}

impl ListQuery {
  pub fn into_filter(self, now: DateTime<Utc>) -> IncidentFilter {
    IncidentFilter {
      incident_type: self.incident_type.filter(|t| !t.trim().is_empty()),
      since: self.since_minutes.and_then(|m| date::lookback_start(m, now)),
      origin_lat: self.origin_lat,
      origin_lng: self.origin_lng,
      radius_m: self.radius_m,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn blank_type_means_no_filter() {
    let q = ListQuery {
      incident_type: Some("  ".into()),
      since_minutes: Some(10),
      ..ListQuery::default()
    };
    let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
    let filter = q.into_filter(now);
    assert!(filter.incident_type.is_none());
    assert_eq!(filter.since, Some(Utc.with_ymd_and_hms(2025, 1, 15, 10, 20, 0).unwrap()));
  }
}
