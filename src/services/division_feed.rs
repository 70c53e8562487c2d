//! Change frames of one division subscription, shared by the SSE and WebSocket
//! transports.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use crate::state::{SharedState, division::Division, store::StateSnapshot};

/// Live feed of `division` frames newer than the last one handed out.
pub struct DivisionFeed {
    state: SharedState,
    division: Division,
    last_revision: u64,
    receiver: broadcast::Receiver<Arc<StateSnapshot>>,
}

impl DivisionFeed {
    /// Subscribe to `division`: the returned snapshot must be sent first, the feed
    /// then yields every later change.
    pub async fn open(state: &SharedState, division: Division) -> (StateSnapshot, Self) {
        let (snapshot, receiver) = state.store().subscribe(division).await;
        let feed = Self {
            state: state.clone(),
            division,
            last_revision: snapshot.revision,
            receiver,
        };
        (snapshot, feed)
    }

    /// Division this feed follows.
    pub fn division(&self) -> Division {
        self.division
    }

    /// Next frame to deliver, or `None` once the store stops broadcasting.
    ///
    /// A lagging receiver gets the current full state instead of the frames it
    /// missed; frames buffered before that resync are then dropped as stale.
    pub async fn next(&mut self) -> Option<Arc<StateSnapshot>> {
        loop {
            let frame = match self.receiver.recv().await {
                Ok(frame) => frame,
                Err(RecvError::Closed) => return None,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(division = %self.division, skipped, "viewer lagged; resending full state");
                    Arc::new(self.state.store().snapshot(self.division).await)
                }
            };

            if frame.revision <= self.last_revision {
                continue;
            }
            self.last_revision = frame.revision;
            return Some(frame);
        }
    }
}
