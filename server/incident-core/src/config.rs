//! Core configuration with sane defaults.

/// Longest accepted dedupe lookback (one year).
pub const MAX_LOOKBACK_MINUTES: i64 = 525_600;

/// Tunable thresholds for duplicate detection and fan-out.
#[derive(Debug, Clone)]
pub struct Config {
  /// Max distance (meters, inclusive) for a prior report to count as a duplicate.
  pub dedupe_radius_m: f64,
  /// How far back (minutes) prior same-type reports are considered.
  pub dedupe_lookback_minutes: i64,
  /// Per-observer queue capacity. A full queue drops the observer.
  pub observer_buffer: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      dedupe_radius_m: 200.0,
      dedupe_lookback_minutes: 10,
      observer_buffer: 256,
    }
  }
}
