use tokio::sync::broadcast;

use super::history::TaskHistoryEvent;

/// Fire-and-forget publisher for task history events.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<TaskHistoryEvent>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a history event. Having no subscribers is not an error: the
    /// event sink is an optional collaborator.
    pub fn publish(&self, event: TaskHistoryEvent) {
        if let Err(broadcast::error::SendError(_)) = self.sender.send(event) {
            // no subscribers
        }
    }

    /// Subscribe to history events.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskHistoryEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}
