//! Incident Platform core: duplicate detection, lifecycle, and live fan-out.
//!
//! Reports of the same type filed close together in space and time are
//! linked to the nearest earlier one. Every committed create/update is
//! broadcast to all live observers; a failing observer is dropped without
//! affecting the rest.
//!
//! Storage and transport are ports: see [`store::IncidentStore`] and
//! [`broadcast::Observer`].

pub mod broadcast;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod geo;
pub mod lifecycle;
pub mod normalize;
pub mod service;
pub mod store;
pub mod types;

pub use broadcast::{Broadcaster, ChannelObserver, Observer, ObserverHandle, PublishReport};
pub use config::Config;
pub use dedupe::{DuplicateMatch, DuplicateMatcher};
pub use error::{DeliveryError, EngineError, StoreError};
pub use service::IncidentService;
pub use store::{IncidentStore, MemoryStore};
pub use types::{
  EventKind, InboundPatch, InboundReport, Incident, IncidentFilter, IncidentNote, LifecycleEvent, Severity, Status,
};
