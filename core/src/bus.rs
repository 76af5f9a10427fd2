// In-process topic bus for sensor readings
//
// Readings are published on fixed topic names (`sensor/temperature`,
// `sensor/humidity`) and fanned out to bounded per-subscriber channels.
// Delivery is best-effort: a full or closed receiver counts the event as
// dropped, and closed subscriptions are pruned on the next publish so a
// disconnected stream consumer stops receiving immediately.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One measurement on one topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorEvent {
    pub topic: String,
    pub sensor_id: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
struct Subscription {
    id: String,
    sender: mpsc::Sender<SensorEvent>,
}

/// Per-topic delivery counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusStats {
    pub total_published: u64,
    pub total_delivered: u64,
    pub dropped_events: u64,
    pub active_subscriptions: usize,
}

pub struct SensorBus {
    // Topic -> subscriber list
    subscriptions: DashMap<String, Vec<Subscription>>,
    stats: DashMap<String, BusStats>,
    // Channel capacity per subscriber
    capacity: usize,
    next_id: AtomicU64,
}

impl SensorBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscriptions: DashMap::new(),
            stats: DashMap::new(),
            capacity: capacity.max(1),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe one channel to several topics at once; the receiver sees an
    /// interleaved stream of whatever is published on any of them
    pub fn subscribe(&self, topics: &[&str]) -> (String, mpsc::Receiver<SensorEvent>) {
        let id = format!("sub_{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.capacity);

        for topic in topics {
            self.subscriptions
                .entry((*topic).to_string())
                .or_default()
                .push(Subscription {
                    id: id.clone(),
                    sender: tx.clone(),
                });
            self.update_stats(topic, |stats| {
                stats.active_subscriptions += 1;
            });
        }

        info!(target: "bus", id = %id, topics = ?topics, "Created subscription");
        (id, rx)
    }

    /// Remove a subscription from every topic it was registered on
    pub fn unsubscribe(&self, subscription_id: &str) {
        let mut touched: Vec<(String, usize)> = Vec::new();
        for mut entry in self.subscriptions.iter_mut() {
            let before = entry.value().len();
            entry.value_mut().retain(|sub| sub.id != subscription_id);
            let removed = before - entry.value().len();
            if removed > 0 {
                touched.push((entry.key().clone(), removed));
            }
        }
        for (topic, removed) in &touched {
            self.update_stats(topic, |stats| {
                stats.active_subscriptions =
                    stats.active_subscriptions.saturating_sub(*removed);
            });
        }
        if !touched.is_empty() {
            debug!(target: "bus", id = %subscription_id, topics = touched.len(), "Unsubscribed");
        }
    }

    /// Publish an event to a topic, returning the number of deliveries
    pub fn publish(&self, topic: &str, event: SensorEvent) -> u64 {
        let mut delivered = 0u64;
        let mut dropped = 0u64;
        let mut closed: Vec<String> = Vec::new();

        if let Some(mut subs) = self.subscriptions.get_mut(topic) {
            for sub in subs.iter() {
                match sub.sender.try_send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        dropped += 1;
                        warn!(target: "bus", id = %sub.id, topic = %topic, "Subscriber queue full, dropping event");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        dropped += 1;
                        closed.push(sub.id.clone());
                    }
                }
            }
            if !closed.is_empty() {
                subs.retain(|sub| !closed.contains(&sub.id));
            }
        }

        self.update_stats(topic, |stats| {
            stats.total_published += 1;
            stats.total_delivered += delivered;
            stats.dropped_events += dropped;
            stats.active_subscriptions =
                stats.active_subscriptions.saturating_sub(closed.len());
        });

        if !closed.is_empty() {
            debug!(target: "bus", topic = %topic, pruned = closed.len(), "Pruned closed subscriptions");
        }
        delivered
    }

    pub fn stats(&self, topic: &str) -> Option<BusStats> {
        self.stats.get(topic).map(|s| s.clone())
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscriptions
            .get(topic)
            .map(|subs| subs.len())
            .unwrap_or(0)
    }

    fn update_stats<F>(&self, topic: &str, f: F)
    where
        F: FnOnce(&mut BusStats),
    {
        let mut entry = self.stats.entry(topic.to_string()).or_default();
        f(entry.value_mut());
    }
}
