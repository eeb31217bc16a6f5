//! Spatio-temporal duplicate detection over recent same-type reports.
//!
//! The caller supplies the candidate set (already filtered by type and
//! lookback window); the matcher only measures distances. A linear scan is
//! fine because the window keeps the set small.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::config::Config;
use crate::geo;
use crate::types::RecentReport;

/// Nearest prior report inside the radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplicateMatch {
  pub id: Uuid,
  pub distance_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplicateMatcher {
  radius_m: f64,
  lookback: Duration,
}

impl DuplicateMatcher {
  pub fn new(radius_m: f64, lookback: Duration) -> Self {
    Self { radius_m, lookback }
  }

  /// Out-of-range lookbacks saturate instead of panicking.
  pub fn from_config(config: &Config) -> Self {
    let lookback = Duration::try_minutes(config.dedupe_lookback_minutes.max(0)).unwrap_or(Duration::MAX);
    Self::new(config.dedupe_radius_m, lookback)
  }

  pub fn radius_m(&self) -> f64 {
    self.radius_m
  }

  /// Oldest `created_at` a candidate may have to be considered at `now`.
  /// Clamps to the earliest representable instant.
  pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_signed(self.lookback).unwrap_or(DateTime::<Utc>::MIN_UTC)
  }

  /// Find the closest candidate within the radius.
  ///
  /// Ties at exactly the same distance keep the earliest in input order.
  pub fn find_duplicate(
    &self,
    candidate_type: &str,
    latitude: f64,
    longitude: f64,
    recent: &[RecentReport],
  ) -> Option<DuplicateMatch> {
    let mut best: Option<DuplicateMatch> = None;

    for prior in recent {
      let distance_m = geo::distance_m(latitude, longitude, prior.latitude, prior.longitude);
      if distance_m > self.radius_m {
        continue;
      }
      let closer = match best {
        Some(current) => distance_m < current.distance_m,
        None => true,
      };
      if closer {
        best = Some(DuplicateMatch {
          id: prior.id,
          distance_m,
        });
      }
    }

    tracing::debug!(
      incident_type = %candidate_type,
      candidates = recent.len(),
      matched = ?best.map(|m| m.id),
      "duplicate scan"
    );
    best
  }
}

impl Default for DuplicateMatcher {
  fn default() -> Self {
    Self::from_config(&Config::default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  /// Meters per degree of latitude on the sphere used by `geo`.
  const M_PER_DEG_LAT: f64 = geo::EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

  fn prior(lat: f64, lon: f64) -> RecentReport {
    RecentReport {
      id: Uuid::new_v4(),
      latitude: lat,
      longitude: lon,
      created_at: Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
    }
  }

  fn north_of(lat: f64, lon: f64, meters: f64) -> RecentReport {
    prior(lat + meters / M_PER_DEG_LAT, lon)
  }

  #[test]
  fn matches_within_default_radius() {
    let matcher = DuplicateMatcher::default();
    let near = prior(10.0, 20.0015);
    let found = matcher.find_duplicate("fire", 10.0, 20.0, &[near.clone()]).unwrap();
    assert_eq!(found.id, near.id);
    assert!(found.distance_m > 150.0 && found.distance_m < 200.0);
  }

  #[test]
  fn tighter_radius_rejects() {
    let matcher = DuplicateMatcher::new(100.0, Duration::minutes(10));
    let near = prior(10.0, 20.0015);
    assert!(matcher.find_duplicate("fire", 10.0, 20.0, &[near]).is_none());
  }

  #[test]
  fn nearest_wins() {
    let matcher = DuplicateMatcher::default();
    let far = north_of(10.0, 20.0, 150.0);
    let close = north_of(10.0, 20.0, 90.0);
    let found = matcher
      .find_duplicate("fire", 10.0, 20.0, &[far, close.clone()])
      .unwrap();
    assert_eq!(found.id, close.id);
  }

  #[test]
  fn empty_candidates_never_match() {
    let matcher = DuplicateMatcher::default();
    for &(lat, lon) in &[(0.0, 0.0), (10.0, 20.0), (-89.0, 179.0)] {
      assert!(matcher.find_duplicate("flood", lat, lon, &[]).is_none());
    }
  }

  #[test]
  fn exact_tie_keeps_first_in_input_order() {
    let matcher = DuplicateMatcher::default();
    let a = prior(10.0, 20.0);
    let b = prior(10.0, 20.0);
    let found = matcher
      .find_duplicate("fire", 10.0, 20.0, &[a.clone(), b])
      .unwrap();
    assert_eq!(found.id, a.id);
    assert_eq!(found.distance_m, 0.0);
  }

  #[test]
  fn radius_is_inclusive() {
    let target = north_of(10.0, 20.0, 120.0);
    let exact = geo::distance_m(10.0, 20.0, target.latitude, target.longitude);
    let matcher = DuplicateMatcher::new(exact, Duration::minutes(10));
    assert!(matcher.find_duplicate("fire", 10.0, 20.0, &[target]).is_some());
  }

  #[test]
  fn window_start_subtracts_lookback() {
    let matcher = DuplicateMatcher::default();
    let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
    assert_eq!(
      matcher.window_start(now),
      Utc.with_ymd_and_hms(2025, 1, 15, 10, 20, 0).unwrap()
    );
  }

  #[test]
  fn huge_lookback_saturates() {
    let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
    for minutes in [i64::MAX, 200_000_000_000] {
      let config = Config {
        dedupe_lookback_minutes: minutes,
        ..Config::default()
      };
      let matcher = DuplicateMatcher::from_config(&config);
      assert_eq!(matcher.window_start(now), DateTime::<Utc>::MIN_UTC);
    }
  }
}
