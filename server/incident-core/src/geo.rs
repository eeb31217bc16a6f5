//! Great-circle distance on a spherical Earth.

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two points given in decimal degrees.
///
/// Inputs are not validated; NaN in, NaN out.
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
  let phi1 = lat1.to_radians();
  let phi2 = lat2.to_radians();
  let dphi = (lat2 - lat1).to_radians();
  let dlambda = (lon2 - lon1).to_radians();

  let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
  // Rounding can push `a` a hair past 1.0 near antipodes.
  let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();
  EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identical_points_are_zero() {
    for &(lat, lon) in &[(0.0, 0.0), (10.0, 20.0), (-33.86, 151.21), (89.9, -179.9)] {
      assert_eq!(distance_m(lat, lon, lat, lon), 0.0);
    }
  }

  #[test]
  fn one_degree_of_longitude_at_equator() {
    let d = distance_m(0.0, 0.0, 0.0, 1.0);
    assert!((d - 111_195.0).abs() < 50.0, "got {}", d);
  }

  #[test]
  fn symmetric() {
    let pairs = [
      ((10.0, 20.0), (10.0, 20.0015)),
      ((51.5074, -0.1278), (48.8566, 2.3522)),
      ((-45.0, 170.0), (45.0, -170.0)),
    ];
    for ((a_lat, a_lon), (b_lat, b_lon)) in pairs {
      let ab = distance_m(a_lat, a_lon, b_lat, b_lon);
      let ba = distance_m(b_lat, b_lon, a_lat, a_lon);
      assert!((ab - ba).abs() < 1e-6, "{} vs {}", ab, ba);
    }
  }

  #[test]
  fn antipodal_points_stay_finite() {
    let d = distance_m(0.0, 0.0, 0.0, 180.0);
    assert!(d.is_finite());
    let half_circumference = std::f64::consts::PI * EARTH_RADIUS_M;
    assert!((d - half_circumference).abs() < 1.0);
  }

  #[test]
  fn distinct_points_are_positive() {
    assert!(distance_m(10.0, 20.0, 10.0, 20.000001) > 0.0);
  }
}
