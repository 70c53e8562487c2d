//! Per-division competition state. All writes go through [`StateStore::mutate`],
//! which bumps the revision and broadcasts the full new state before the write
//! lock is released, so subscribers of one division see updates in apply order.

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};

use crate::{
    error::ServiceError,
    state::{competition::CompetitionState, division::Division, hub::StateHub},
};

/// Default number of snapshots buffered per subscriber before it lags.
pub const DEFAULT_HUB_CAPACITY: usize = 32;

/// Read-only view of a division at a given revision.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    /// Division the state belongs to.
    pub division: Division,
    /// Monotonic mutation counter, starting at `0` for the empty state.
    pub revision: u64,
    /// Competition name and competitors.
    pub state: CompetitionState,
}

struct Board {
    state: CompetitionState,
    revision: u64,
}

struct DivisionSlot {
    board: RwLock<Board>,
    hub: StateHub,
}

impl DivisionSlot {
    fn new(capacity: usize) -> Self {
        Self {
            board: RwLock::new(Board {
                state: CompetitionState::default(),
                revision: 0,
            }),
            hub: StateHub::new(capacity),
        }
    }
}

/// In-memory store holding one [`CompetitionState`] per division.
pub struct StateStore {
    women: DivisionSlot,
    men: DivisionSlot,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_CAPACITY)
    }
}

impl StateStore {
    /// Create an empty store whose hubs buffer `capacity` snapshots per subscriber.
    pub fn new(capacity: usize) -> Self {
        Self {
            women: DivisionSlot::new(capacity),
            men: DivisionSlot::new(capacity),
        }
    }

    fn slot(&self, division: Division) -> &DivisionSlot {
        match division {
            Division::Women => &self.women,
            Division::Men => &self.men,
        }
    }

    /// Current snapshot of `division`.
    pub async fn snapshot(&self, division: Division) -> StateSnapshot {
        let board = self.slot(division).board.read().await;
        StateSnapshot {
            division,
            revision: board.revision,
            state: board.state.clone(),
        }
    }

    /// Subscribe to `division`, returning the current snapshot alongside the receiver.
    ///
    /// The receiver is registered while the read lock is held, so every mutation
    /// after the returned snapshot is delivered and none before it is.
    pub async fn subscribe(
        &self,
        division: Division,
    ) -> (StateSnapshot, broadcast::Receiver<Arc<StateSnapshot>>) {
        let slot = self.slot(division);
        let board = slot.board.read().await;
        let receiver = slot.hub.subscribe();
        let snapshot = StateSnapshot {
            division,
            revision: board.revision,
            state: board.state.clone(),
        };
        (snapshot, receiver)
    }

    /// Apply `change` to `division` and broadcast the resulting state.
    ///
    /// When `change` fails nothing is broadcast and the revision is unchanged;
    /// `change` must not leave the state half-modified on error.
    pub async fn mutate<T, F>(
        &self,
        division: Division,
        change: F,
    ) -> Result<(T, StateSnapshot), ServiceError>
    where
        F: FnOnce(&mut CompetitionState) -> Result<T, ServiceError>,
    {
        let slot = self.slot(division);
        let mut board = slot.board.write().await;
        let value = change(&mut board.state)?;

        board.revision += 1;
        board.state.touch();
        let snapshot = StateSnapshot {
            division,
            revision: board.revision,
            state: board.state.clone(),
        };
        slot.hub.broadcast(Arc::new(snapshot.clone()));
        drop(board);

        Ok((value, snapshot))
    }

    /// Number of live subscribers on `division`.
    pub fn subscriber_count(&self, division: Division) -> usize {
        self.slot(division).hub.receiver_count()
    }
}
