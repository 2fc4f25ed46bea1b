//! Publish/subscribe channel for lifecycle events.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::debug;
use vaultview_core::{SubscriptionId, TaskEvent};

/// Receiving end of an event subscription.
///
/// Dropping the handle detaches it; the bus prunes it on the next publish.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<TaskEvent>,
}

impl Subscription {
    /// Handle to pass to `unsubscribe`.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next event. `None` once the subscription is detached.
    pub async fn recv(&mut self) -> Option<TaskEvent> {
        self.receiver.recv().await
    }

    /// Take an already delivered event without waiting.
    pub fn try_recv(&mut self) -> Option<TaskEvent> {
        self.receiver.try_recv().ok()
    }
}

/// Fan-out of lifecycle events to any number of subscriptions.
#[derive(Debug, Default)]
pub struct EventBus {
    listeners: Mutex<HashMap<SubscriptionId, mpsc::UnboundedSender<TaskEvent>>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscription.
    pub fn subscribe(&self) -> Subscription {
        let (tx, receiver) = mpsc::unbounded_channel();
        let id = SubscriptionId::new();
        self.lock().insert(id, tx);
        debug!("Subscription {} attached", id);
        Subscription { id, receiver }
    }

    /// Detach a subscription. Returns false if it was not attached.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            debug!("Subscription {} detached", id);
        }
        removed
    }

    /// Deliver an event to every live subscription. Returns the number of
    /// subscriptions reached.
    pub fn publish(&self, event: TaskEvent) -> usize {
        let mut listeners = self.lock();
        listeners.retain(|_, tx| tx.send(event.clone()).is_ok());
        listeners.len()
    }

    /// Number of attached subscriptions.
    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriptionId, mpsc::UnboundedSender<TaskEvent>>> {
        self.listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultview_core::TaskId;

    fn created(id: &str) -> TaskEvent {
        TaskEvent::CreateTask { task_id: TaskId::new(id) }
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        assert_eq!(bus.publish(created("t-1")), 2);
        assert_eq!(a.recv().await, Some(created("t-1")));
        assert_eq!(b.recv().await, Some(created("t-1")));
    }

    #[test]
    fn test_unsubscribe_detaches() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();

        assert!(bus.unsubscribe(sub.id()));
        assert!(!bus.unsubscribe(sub.id()));
        assert_eq!(bus.publish(created("t-1")), 0);
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_dropped_subscription_is_pruned() {
        let bus = EventBus::new();
        let sub = bus.subscribe();
        let _kept = bus.subscribe();
        drop(sub);

        assert_eq!(bus.publish(created("t-1")), 1);
        assert_eq!(bus.listener_count(), 1);
    }
}
