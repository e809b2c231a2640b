//! Change notification fan-out.
//!
//! # Invariants
//! - Publishing is fire-and-forget; it never fails the caller.
//! - Observers only receive messages published after they subscribed.

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Topic used when the reconciler changed at least one item.
pub const TODO_UPDATED_TOPIC: &str = "TodoItemUpdated";
/// Marker payload sent with [`TODO_UPDATED_TOPIC`].
pub const TODO_UPDATED_MESSAGE: &str = "Todo items updated";

const DEFAULT_CAPACITY: usize = 64;

/// Abstract broadcast capability.
pub trait Notifier: Send + Sync {
    fn publish(&self, topic: &str, message: &str);
}

/// One broadcast message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub topic: String,
    pub message: String,
}

/// In-process broadcast hub backed by `tokio::sync::broadcast`.
///
/// Slow observers may miss messages (`RecvError::Lagged`).
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notification>,
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _rx) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Registers a new observer.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, topic: &str, message: &str) {
        let notification = Notification {
            topic: topic.to_string(),
            message: message.to_string(),
        };
        // No observers is not an error.
        let delivered = self.sender.send(notification).unwrap_or(0);
        debug!("event=notify_publish module=notify status=ok topic={topic} observers={delivered}");
    }
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn publish(&self, topic: &str, message: &str) {
        (**self).publish(topic, message);
    }
}
