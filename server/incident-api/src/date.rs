//! Date helpers for query parameters.

use chrono::{DateTime, Duration, Utc};

/// Start of a `since_minutes` lookback ending at `now`. Non-positive means no bound.
pub fn lookback_start(since_minutes: i64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
  if since_minutes <= 0 {
    return None;
  }
  Duration::try_minutes(since_minutes).and_then(|d| now.checked_sub_signed(d))
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn lookback_start_subtracts_minutes() {
    let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
    assert_eq!(
      lookback_start(15, now),
      Some(Utc.with_ymd_and_hms(2025, 1, 15, 10, 15, 0).unwrap())
    );
  }

  #[test]
  fn zero_or_negative_is_unbounded() {
    let now = Utc::now();
    assert_eq!(lookback_start(0, now), None);
    assert_eq!(lookback_start(-5, now), None);
  }

  #[test]
  fn absurd_lookback_is_unbounded() {
    assert_eq!(lookback_start(i64::MAX, Utc::now()), None);
  }
}
