use tokio::sync::broadcast;

use ghostchat_types::events::LifecycleEvent;

/// Broadcast channel for chatroom lifecycle events. The manager publishes
/// here instead of carrying an implicit emitter; consumers (audit logging)
/// subscribe explicitly.
#[derive(Clone)]
pub struct LifecycleBus {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl LifecycleBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Dropped silently when nobody is subscribed.
    pub fn emit(&self, event: LifecycleEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for LifecycleBus {
    fn default() -> Self {
        Self::new()
    }
}
