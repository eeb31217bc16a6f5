//! Live fan-out of lifecycle events to connected observers.
//!
//! Delivery is a non-blocking hand-off into each observer's own queue; the
//! transport drains that queue at its own pace. An observer whose hand-off
//! fails (queue full, receiver gone, encode error) is dropped once the
//! publish pass is over. No retries, no backfill.
//!
//! Lock discipline: `observers` is held only to snapshot or mutate the map.
//! `publish_order` serializes publishes so every observer sees events in the
//! order `publish` was called; it never blocks subscribe/unsubscribe.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::DeliveryError;
use crate::types::LifecycleEvent;

/// One live subscriber as seen by the broadcaster.
pub trait Observer: Send + Sync {
  /// Hand the event to the observer without waiting on I/O.
  fn deliver(&self, event: &LifecycleEvent) -> Result<(), DeliveryError>;

  /// Known-dead observers are skipped and dropped on the next publish.
  fn is_closed(&self) -> bool {
    false
  }
}

/// Observer backed by a bounded channel of JSON text frames.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
  tx: mpsc::Sender<String>,
}

impl ChannelObserver {
  /// Create an observer plus the receiver the transport drains.
  pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Self { tx }, rx)
  }
}

impl Observer for ChannelObserver {
  fn deliver(&self, event: &LifecycleEvent) -> Result<(), DeliveryError> {
    let frame = serde_json::to_string(event).map_err(|e| DeliveryError::Encode(e.to_string()))?;
    self.tx.try_send(frame).map_err(|e| match e {
      TrySendError::Full(_) => DeliveryError::Lagging,
      TrySendError::Closed(_) => DeliveryError::Closed,
    })
  }

  fn is_closed(&self) -> bool {
    self.tx.is_closed()
  }
}

/// Opaque registry key returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(Uuid);

impl fmt::Display for ObserverHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "obs-{}", self.0)
  }
}

/// Result of one fan-out pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
  pub delivered: usize,
  pub dropped: Vec<ObserverHandle>,
}

pub struct Broadcaster {
  observers: Mutex<HashMap<ObserverHandle, Arc<dyn Observer>>>,
  publish_order: Mutex<()>,
}

impl Broadcaster {
  pub fn new() -> Self {
    Self {
      observers: Mutex::new(HashMap::new()),
      publish_order: Mutex::new(()),
    }
  }

  /// Register an observer.
  ///
  /// Call only after the transport's accept/handshake has completed, so a
  /// concurrent publish never targets a half-open connection.
  pub async fn subscribe<O>(&self, observer: O) -> ObserverHandle
  where
    O: Observer + 'static,
  {
    let handle = ObserverHandle(Uuid::new_v4());
    let count = {
      let mut observers = self.observers.lock().await;
      observers.insert(handle, Arc::new(observer));
      observers.len()
    };
    tracing::info!(observer = %handle, observers = count, "observer subscribed");
    handle
  }

  /// Remove an observer. Returns false if it was already gone.
  pub async fn unsubscribe(&self, handle: ObserverHandle) -> bool {
    let removed = self.observers.lock().await.remove(&handle).is_some();
    if removed {
      tracing::info!(observer = %handle, "observer unsubscribed");
    }
    removed
  }

  /// Deliver `event` to every registered observer.
  ///
  /// Precondition: the incident state in `event` is already committed.
  /// Never fails as a whole; failing observers are reported and removed.
  pub async fn publish(&self, event: &LifecycleEvent) -> PublishReport {
    let _order = self.publish_order.lock().await;

    let snapshot: Vec<(ObserverHandle, Arc<dyn Observer>)> = {
      let observers = self.observers.lock().await;
      observers
        .iter()
        .map(|(handle, observer)| (*handle, Arc::clone(observer)))
        .collect()
    };

    let mut report = PublishReport::default();
    for (handle, observer) in &snapshot {
      if observer.is_closed() {
        report.dropped.push(*handle);
        continue;
      }
      match observer.deliver(event) {
        Ok(()) => report.delivered += 1,
        Err(e) => {
          tracing::warn!(
            observer = %handle,
            incident_id = %event.incident.id,
            "dropping observer after failed delivery: {}",
            e
          );
          report.dropped.push(*handle);
        }
      }
    }

    if !report.dropped.is_empty() {
      let mut observers = self.observers.lock().await;
      for handle in &report.dropped {
        observers.remove(handle);
      }
    }

    tracing::debug!(
      event = ?event.kind,
      incident_id = %event.incident.id,
      delivered = report.delivered,
      dropped = report.dropped.len(),
      "published lifecycle event"
    );
    report
  }

  pub async fn contains(&self, handle: ObserverHandle) -> bool {
    self.observers.lock().await.contains_key(&handle)
  }

  pub async fn observer_count(&self) -> usize {
    self.observers.lock().await.len()
  }

  /// Handles of every registered observer, in no particular order.
  pub async fn handles(&self) -> Vec<ObserverHandle> {
    self.observers.lock().await.keys().copied().collect()
  }
}

impl Default for Broadcaster {
  fn default() -> Self {
    Self::new()
  }
}
