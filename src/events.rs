//! Best-effort fan-out of system events to live subscribers.
//!
//! Every subscriber owns a bounded channel. `broadcast` never waits for a
//! subscriber: a full channel is simply skipped for that event. Delivery is
//! at-most-once and may drop under load, which is fine for a live-status
//! feed where the next tick refreshes stale state anyway.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Event published when a domain check completed.
pub const EVENT_MONITORING_IP: &str = "monitoring_ip";
/// Event published when a domain's cached stats snapshot was refreshed.
pub const EVENT_DOMAIN_STATS: &str = "monitoring_domain_stats";
/// Event published around site control actions.
pub const EVENT_SITE_CONTROL: &str = "site_control";

/// Per-subscriber channel capacity. Sized so ordinary bursts do not stall;
/// anything beyond it is dropped for that subscriber.
pub const SUBSCRIBER_BUFFER: usize = 10;

/// Envelope broadcast on the bus.
///
/// The timestamp is assigned by the bus at broadcast time, overriding
/// whatever the producer set.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(kind: &str, data: Value) -> Self {
        Self {
            kind: kind.to_string(),
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Receiving side of a bus subscription.
///
/// Unsubscribes itself when dropped, so an abandoned SSE connection cannot
/// leak its channel.
pub struct Subscription {
    id: u64,
    bus: EventBus,
    receiver: mpsc::Receiver<Event>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.id);
    }
}

type SubscriberMap = HashMap<u64, mpsc::Sender<Event>>;

#[derive(Default)]
struct BusInner {
    subscribers: Mutex<SubscriberMap>,
    next_id: AtomicU64,
}

/// Fan-out broadcast registry.
///
/// Cheap to clone; clones share one subscriber registry.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and hand back its receiving half.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        let mut subscribers = self.lock_subscribers();
        subscribers.insert(id, tx);
        debug!(total_clients = subscribers.len(), "event subscriber added");
        drop(subscribers);

        Subscription {
            id,
            bus: self.clone(),
            receiver: rx,
        }
    }

    /// Remove a subscriber. Safe to call again for an already-removed id.
    pub fn unsubscribe(&self, id: u64) {
        let mut subscribers = self.lock_subscribers();
        if subscribers.remove(&id).is_some() {
            debug!(total_clients = subscribers.len(), "event subscriber removed");
        }
    }

    /// Stamp the event and attempt a non-blocking send to every subscriber.
    ///
    /// Subscribers whose channel is full miss this event; the publisher is
    /// never slowed down or notified.
    pub fn broadcast(&self, mut event: Event) {
        event.timestamp = Utc::now();

        let subscribers = self.lock_subscribers();
        if subscribers.is_empty() {
            return;
        }

        trace!(kind = %event.kind, clients = subscribers.len(), "broadcasting event");

        for (id, sender) in subscribers.iter() {
            if sender.try_send(event.clone()).is_err() {
                trace!(subscriber = id, kind = %event.kind, "subscriber not keeping up, event skipped");
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, SubscriberMap> {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Instant;

    #[tokio::test]
    async fn subscribers_receive_broadcast_events() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();

        bus.broadcast(Event::new("test", json!({"n": 1})));

        let event = sub.recv().await.unwrap();
        assert_eq!(event.kind, "test");
        assert_eq!(event.data, json!({"n": 1}));
    }

    #[tokio::test]
    async fn broadcast_overrides_producer_timestamp() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();

        let stale = Event {
            kind: "test".to_string(),
            data: json!({}),
            timestamp: Utc::now() - chrono::Duration::hours(5),
        };
        let before = Utc::now();
        bus.broadcast(stale);

        let event = sub.recv().await.unwrap();
        assert!(event.timestamp >= before);
    }

    #[tokio::test]
    async fn full_subscriber_is_skipped_without_blocking() {
        let bus = EventBus::new();
        let _stalled = bus.subscribe();
        let mut healthy = bus.subscribe();

        let start = Instant::now();
        for i in 0..(SUBSCRIBER_BUFFER * 3) {
            bus.broadcast(Event::new("test", json!({"n": i})));
        }
        assert!(
            start.elapsed().as_millis() < 100,
            "broadcast must not wait for a stalled subscriber"
        );

        // Nothing drained during the burst, so each channel kept exactly
        // one buffer's worth and silently missed the rest.
        let mut received = 0;
        while healthy.try_recv().is_some() {
            received += 1;
        }
        assert_eq!(received, SUBSCRIBER_BUFFER);
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        let id = sub.id();

        assert_eq!(bus.subscriber_count(), 1);
        bus.unsubscribe(id);
        bus.unsubscribe(id);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn dropping_a_subscription_unregisters_it() {
        let bus = EventBus::new();
        {
            let _sub = bus.subscribe();
            assert_eq!(bus.subscriber_count(), 1);
        }
        assert_eq!(bus.subscriber_count(), 0);
    }
}
