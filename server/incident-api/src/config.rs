//! Server configuration from environment variables.

use std::net::IpAddr;
use std::str::FromStr;

use incident_core::config::MAX_LOOKBACK_MINUTES;
use incident_core::Config;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct ServerConfig {
  pub database_url: String,
  pub bind_addr: IpAddr,
  pub port: u16,
  /// `*` or a list of exact origins.
  pub cors_origins: Vec<String>,
  pub engine: Config,
}

impl ServerConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Build from any key lookup (tests pass a map instead of the process env).
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let database_url = lookup("DATABASE_URL")
      .filter(|v| !v.trim().is_empty())
      .ok_or(ConfigError::Missing("DATABASE_URL"))?;

    let defaults = Config::default();
    let engine = Config {
      dedupe_radius_m: parse_or(&lookup, "DEDUPE_RADIUS_M", defaults.dedupe_radius_m)?,
      dedupe_lookback_minutes: parse_or(&lookup, "DEDUPE_LOOKBACK_MINUTES", defaults.dedupe_lookback_minutes)?,
      observer_buffer: parse_or(&lookup, "OBSERVER_BUFFER", defaults.observer_buffer)?,
    };
    if !(engine.dedupe_radius_m.is_finite() && engine.dedupe_radius_m >= 0.0) {
      return Err(ConfigError::invalid("DEDUPE_RADIUS_M", "must be a non-negative number"));
    }
    if !(0..=MAX_LOOKBACK_MINUTES).contains(&engine.dedupe_lookback_minutes) {
      return Err(ConfigError::invalid(
        "DEDUPE_LOOKBACK_MINUTES",
        &format!("must be between 0 and {}", MAX_LOOKBACK_MINUTES),
      ));
    }
    if engine.observer_buffer == 0 {
      return Err(ConfigError::invalid("OBSERVER_BUFFER", "must be at least 1"));
    }

    let cors_origins = lookup("CORS_ORIGINS")
      .unwrap_or_else(|| "*".into())
      .split(',')
      .map(|o| o.trim().to_string())
      .filter(|o| !o.is_empty())
      .collect();

    Ok(Self {
      database_url,
      bind_addr: parse_or(&lookup, "BIND_ADDR", IpAddr::from([127, 0, 0, 1]))?,
      port: parse_or(&lookup, "PORT", 8000)?,
      cors_origins,
      engine,
    })
  }
}

fn parse_or<T: FromStr>(
  lookup: &impl Fn(&str) -> Option<String>,
  key: &'static str,
  default: T,
) -> Result<T, ConfigError> {
  match lookup(key) {
    Some(raw) if !raw.trim().is_empty() => raw
      .trim()
      .parse()
      .map_err(|_| ConfigError::invalid(key, &format!("cannot parse {:?}", raw))),
    _ => Ok(default),
  }
}
