//! Push-based change feed for inventory collections.
//!
//! # Responsibility
//! - Hand out subscriptions for the material list, category list and
//!   usage journal.
//! - Broadcast a fresh snapshot to every live subscriber after a write.
//!
//! # Invariants
//! - A new subscription is primed with the snapshot current at subscribe time.
//! - Snapshots are delivered in publish order per subscriber.
//! - Subscribers whose receiver was dropped are pruned on the next publish.

use crate::model::material::Material;
use crate::model::usage_log::UsageLogEntry;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::time::Duration;

/// Receiving end of one collection feed.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: Receiver<T>,
}

impl<T> Subscription<T> {
    /// Drains pending snapshots and returns the newest one, if any.
    pub fn latest(&self) -> Option<T> {
        self.rx.try_iter().last()
    }

    /// Returns the next snapshot without blocking.
    pub fn try_next(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next snapshot.
    ///
    /// Returns `None` on timeout or once the feed is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(value) => Some(value),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

struct Topic<T> {
    subscribers: Mutex<Vec<Sender<T>>>,
}

impl<T: Clone> Topic<T> {
    fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    fn subscribe(&self, initial: T) -> Subscription<T> {
        let (tx, rx) = unbounded();
        // Receiver is alive here, so the priming send cannot fail.
        let _ = tx.send(initial);
        self.lock().push(tx);
        Subscription { rx }
    }

    fn publish(&self, snapshot: T) {
        self.lock().retain(|tx| tx.send(snapshot.clone()).is_ok());
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sender<T>>> {
        // Poisoning is ignored: the sender list is valid after any panic.
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Change feed covering every observable inventory collection.
pub struct ChangeFeed {
    materials: Topic<Vec<Material>>,
    categories: Topic<Vec<String>>,
    logs: Topic<Vec<UsageLogEntry>>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self {
            materials: Topic::new(),
            categories: Topic::new(),
            logs: Topic::new(),
        }
    }

    pub fn subscribe_materials(&self, current: Vec<Material>) -> Subscription<Vec<Material>> {
        self.materials.subscribe(current)
    }

    pub fn subscribe_categories(&self, current: Vec<String>) -> Subscription<Vec<String>> {
        self.categories.subscribe(current)
    }

    pub fn subscribe_logs(&self, current: Vec<UsageLogEntry>) -> Subscription<Vec<UsageLogEntry>> {
        self.logs.subscribe(current)
    }

    pub fn publish_materials(&self, snapshot: Vec<Material>) {
        self.materials.publish(snapshot);
    }

    pub fn publish_categories(&self, snapshot: Vec<String>) {
        self.categories.publish(snapshot);
    }

    pub fn publish_logs(&self, snapshot: Vec<UsageLogEntry>) {
        self.logs.publish(snapshot);
    }

    /// Live subscriber count across all collections.
    pub fn subscriber_count(&self) -> usize {
        self.materials.len() + self.categories.len() + self.logs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::ChangeFeed;
    use std::time::Duration;

    #[test]
    fn subscription_is_primed_and_receives_publishes_in_order() {
        let feed = ChangeFeed::new();
        let sub = feed.subscribe_categories(vec!["Paint".to_string()]);

        feed.publish_categories(vec!["Paint".to_string(), "Pens".to_string()]);

        assert_eq!(sub.try_next(), Some(vec!["Paint".to_string()]));
        assert_eq!(sub.try_next().map(|names| names.len()), Some(2));
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn latest_conflates_pending_snapshots() {
        let feed = ChangeFeed::new();
        let sub = feed.subscribe_categories(Vec::new());
        feed.publish_categories(vec!["A".to_string()]);
        feed.publish_categories(vec!["B".to_string()]);

        assert_eq!(sub.latest(), Some(vec!["B".to_string()]));
        assert_eq!(sub.recv_timeout(Duration::from_millis(5)), None);
    }

    #[test]
    fn dropped_subscribers_are_pruned_on_publish() {
        let feed = ChangeFeed::new();
        let keep = feed.subscribe_logs(Vec::new());
        let dropped = feed.subscribe_materials(Vec::new());
        assert_eq!(feed.subscriber_count(), 2);

        drop(dropped);
        feed.publish_materials(Vec::new());
        assert_eq!(feed.subscriber_count(), 1);
        drop(keep);
    }

    #[test]
    fn subscriptions_can_be_consumed_from_another_thread() {
        let feed = ChangeFeed::new();
        let sub = feed.subscribe_categories(Vec::new());
        let handle = std::thread::spawn(move || {
            let _primed = sub.recv_timeout(Duration::from_secs(1));
            sub.recv_timeout(Duration::from_secs(1))
        });
        feed.publish_categories(vec!["Crayons".to_string()]);
        assert_eq!(handle.join().unwrap(), Some(vec!["Crayons".to_string()]));
    }
}
