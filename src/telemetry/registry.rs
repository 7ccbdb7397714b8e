use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use super::snapshot::{Payload, Published};

pub type SubscriberId = Uuid;

/// Receiving half handed to a connection task. The registry only keeps the
/// sending half, keyed by id.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<Payload>,
}

#[derive(Default)]
struct Inner {
    latest: Option<Arc<Published>>,
    subscribers: HashMap<SubscriberId, mpsc::Sender<Payload>>,
}

/// Connected consumers plus the latest published snapshot.
///
/// Both live under one lock so a subscriber sees either the catch-up copy of
/// a snapshot or its broadcast, never both and never neither.
pub struct SubscriberRegistry {
    inner: Mutex<Inner>,
    buffer: usize,
}

impl SubscriberRegistry {
    /// `buffer` is how many undelivered payloads a subscriber may queue
    /// before it is considered too slow and dropped.
    pub fn new(buffer: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            buffer: buffer.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new subscriber, queueing the latest snapshot for it first.
    pub fn connect(&self) -> Subscription {
        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::channel(self.buffer);

        let mut inner = self.lock();
        if let Some(latest) = &inner.latest {
            // fresh channel with capacity >= 1 cannot be full
            let _ = sender.try_send(latest.payload.clone());
        }
        inner.subscribers.insert(id, sender);
        log::info!("subscriber {} connected ({} total)", id, inner.subscribers.len());

        Subscription { id, receiver }
    }

    pub fn disconnect(&self, id: SubscriberId) {
        let mut inner = self.lock();
        if inner.subscribers.remove(&id).is_some() {
            log::info!(
                "subscriber {} disconnected ({} remaining)",
                id,
                inner.subscribers.len()
            );
        }
    }

    /// Replace the latest snapshot and queue it for every subscriber.
    /// Subscribers whose channel is closed or full are dropped. Returns the
    /// number of subscribers the payload was queued for.
    pub fn publish(&self, published: Published) -> usize {
        let published = Arc::new(published);
        let mut inner = self.lock();
        inner.latest = Some(published.clone());

        let mut delivered = 0;
        inner.subscribers.retain(|id, sender| {
            match sender.try_send(published.payload.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    log::warn!("subscriber {} is not keeping up, dropping it", id);
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    log::debug!("subscriber {} already closed", id);
                    false
                }
            }
        });
        delivered
    }

    pub fn latest(&self) -> Option<Arc<Published>> {
        self.lock().latest.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::position::PositionSample;
    use crate::telemetry::snapshot::TelemetrySnapshot;
    use chrono::Utc;

    fn published(lat: f64) -> Published {
        let sample = PositionSample {
            latitude: lat,
            longitude: 10.0,
            altitude_km: 420.0,
            velocity: 7.66,
        };
        Published::new(TelemetrySnapshot::assemble(sample, Vec::new(), None, 7, Utc::now()))
            .unwrap()
    }

    #[test]
    fn no_catch_up_before_first_publish() {
        let registry = SubscriberRegistry::new(4);
        let mut sub = registry.connect();
        assert!(sub.receiver.try_recv().is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn late_joiner_gets_exactly_one_catch_up() {
        let registry = SubscriberRegistry::new(4);
        registry.publish(published(1.0));
        registry.publish(published(2.0));

        let mut sub = registry.connect();
        let catch_up = sub.receiver.try_recv().unwrap();
        assert_eq!(catch_up, registry.latest().unwrap().payload);
        assert!(catch_up.contains("\"lat\":2.0"));
        assert!(sub.receiver.try_recv().is_err());

        registry.publish(published(3.0));
        let next = sub.receiver.try_recv().unwrap();
        assert!(next.contains("\"lat\":3.0"));
    }

    #[test]
    fn broadcast_reaches_everyone() {
        let registry = SubscriberRegistry::new(4);
        let mut a = registry.connect();
        let mut b = registry.connect();
        assert_eq!(registry.publish(published(1.0)), 2);
        assert_eq!(a.receiver.try_recv().unwrap(), b.receiver.try_recv().unwrap());
    }

    #[test]
    fn closed_subscriber_is_removed_without_affecting_others() {
        let registry = SubscriberRegistry::new(4);
        let closed = registry.connect();
        let mut open = registry.connect();
        drop(closed.receiver);

        assert_eq!(registry.publish(published(1.0)), 1);
        assert_eq!(registry.len(), 1);
        assert!(open.receiver.try_recv().is_ok());
    }

    #[test]
    fn slow_subscriber_is_dropped() {
        let registry = SubscriberRegistry::new(1);
        let slow = registry.connect();
        registry.publish(published(1.0));
        assert_eq!(registry.len(), 1);

        registry.publish(published(2.0));
        assert_eq!(registry.len(), 0);
        drop(slow);
    }

    #[test]
    fn disconnect_is_idempotent() {
        let registry = SubscriberRegistry::new(4);
        let sub = registry.connect();
        registry.disconnect(sub.id);
        registry.disconnect(sub.id);
        assert!(registry.is_empty());
        assert_eq!(registry.publish(published(1.0)), 0);
    }
}
