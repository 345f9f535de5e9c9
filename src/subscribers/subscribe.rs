use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Each subscriber is driven by its own worker fed by a bounded queue owned by the
/// [`SubscriberSet`](crate::SubscriberSet), so a slow subscriber never delays the
/// sync loop or its siblings.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    ///
    /// On overflow, events for this subscriber are **dropped**.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
