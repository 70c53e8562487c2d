use std::sync::Arc;

use tokio::sync::broadcast;

use crate::state::store::StateSnapshot;

/// Broadcast hub fanning full-state snapshots out to every viewer of a division.
pub struct StateHub {
    sender: broadcast::Sender<Arc<StateSnapshot>>,
}

impl StateHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent snapshots.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<StateSnapshot>> {
        self.sender.subscribe()
    }

    /// Send a snapshot to all current subscribers, ignoring the no-subscriber case.
    pub fn broadcast(&self, snapshot: Arc<StateSnapshot>) {
        let _ = self.sender.send(snapshot);
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
