//! Ordered in-process pub/sub event bus.
//!
//! Subscribers for a given event name are invoked synchronously in
//! subscription order. A subscriber that errors is logged and skipped —
//! it never prevents later subscribers (for this event, or later events)
//! from running.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

/// A single published event, retained for `list_events`.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub seq: u64,
    pub name: String,
    pub payload: Value,
}

type Subscriber = Box<dyn Fn(&EventRecord) -> std::result::Result<(), String> + Send + Sync>;

struct Registration {
    id: String,
    handler: Subscriber,
}

#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<String, Vec<Registration>>>,
    log: RwLock<Vec<EventRecord>>,
    seq: std::sync::atomic::AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `subscriber_id` for events named `event`.
    /// A second `subscribe` with the same `(event, subscriber_id)` pair is
    /// a no-op (duplicate subscriptions are deduplicated).
    pub fn subscribe<F>(&self, event: &str, subscriber_id: &str, handler: F)
    where
        F: Fn(&EventRecord) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        let mut subs = self.subscribers.write();
        let list = subs.entry(event.to_owned()).or_default();
        if list.iter().any(|r| r.id == subscriber_id) {
            return;
        }
        list.push(Registration {
            id: subscriber_id.to_owned(),
            handler: Box::new(handler),
        });
    }

    /// Remove a single subscriber. Returns whether anything was removed.
    pub fn unsubscribe(&self, event: &str, subscriber_id: &str) -> bool {
        let mut subs = self.subscribers.write();
        if let Some(list) = subs.get_mut(event) {
            let before = list.len();
            list.retain(|r| r.id != subscriber_id);
            return list.len() != before;
        }
        false
    }

    /// Publish an event, invoking every subscriber for `event` in
    /// subscription order. Errors are logged and swallowed (§4.9, §7).
    pub fn publish(&self, event: &str, payload: Value) {
        let seq = self
            .seq
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let record = EventRecord {
            seq,
            name: event.to_owned(),
            payload,
        };
        self.log.write().push(record.clone());

        let subs = self.subscribers.read();
        if let Some(list) = subs.get(event) {
            for reg in list {
                if let Err(e) = (reg.handler)(&record) {
                    tracing::warn!(event = %event, subscriber = %reg.id, error = %e, "event subscriber failed");
                }
            }
        }
    }

    /// Remove all subscribers for one event name (the published log is
    /// untouched).
    pub fn clear(&self, event: &str) {
        self.subscribers.write().remove(event);
    }

    /// Remove every subscriber for every event and wipe the published log.
    pub fn clear_all(&self) {
        self.subscribers.write().clear();
        self.log.write().clear();
    }

    /// The full ordered log of published events.
    pub fn list_events(&self) -> Vec<EventRecord> {
        self.log.read().clone()
    }
}
