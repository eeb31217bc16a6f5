//! Shared application state.

use incident_core::IncidentService;

pub struct AppState<S> {
  pub service: IncidentService<S>,
}

impl<S> AppState<S> {
  pub fn new(service: IncidentService<S>) -> Self {
    Self { service }
  }
}
