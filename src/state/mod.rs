/// Competitors, scores and the per-division competition state.
pub mod competition;
/// Divisions and their apparatus.
pub mod division;
/// Snapshot broadcast hub.
pub mod hub;
/// Competition ranking engine.
pub mod ranking;
/// Per-division state store.
pub mod store;

use std::{collections::HashSet, future::Future, sync::Arc};

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::sheet_bridge::SheetBridge,
    error::ServiceError,
    state::{division::Division, store::StateStore},
};

/// Application state shared by every handler and background task.
pub type SharedState = Arc<AppState>;

/// Transport a viewer is connected through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerTransport {
    /// `GET /sse/{division}`.
    Sse,
    /// `GET /ws`.
    WebSocket,
}

#[derive(Debug, Clone)]
/// Bookkeeping for one connected viewer.
pub struct ViewerConnection {
    /// How the viewer is connected.
    pub transport: ViewerTransport,
    /// Divisions the viewer currently follows.
    pub divisions: HashSet<Division>,
}

/// Central application state: per-division scoreboards, the spreadsheet bridge
/// and the registry of connected viewers.
pub struct AppState {
    config: AppConfig,
    store: StateStore,
    sheet_bridge: RwLock<Option<Arc<dyn SheetBridge>>>,
    persistence_gate: Mutex<()>,
    viewers: DashMap<Uuid, ViewerConnection>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application runs in degraded mode until a spreadsheet bridge is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            config,
            store: StateStore::default(),
            sheet_bridge: RwLock::new(None),
            persistence_gate: Mutex::new(()),
            viewers: DashMap::new(),
        })
    }

    /// Configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Per-division scoreboards.
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Obtain a handle to the current spreadsheet bridge, if one is installed.
    pub async fn sheet_bridge(&self) -> Option<Arc<dyn SheetBridge>> {
        let guard = self.sheet_bridge.read().await;
        guard.as_ref().cloned()
    }

    /// Install a spreadsheet bridge and leave degraded mode.
    pub async fn install_sheet_bridge(&self, bridge: Arc<dyn SheetBridge>) {
        let mut guard = self.sheet_bridge.write().await;
        *guard = Some(bridge);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.sheet_bridge.read().await;
        guard.is_none()
    }

    /// Register a viewer; it is removed again when the returned guard drops.
    pub fn register_viewer(self: &Arc<Self>, transport: ViewerTransport) -> ViewerRegistration {
        let id = Uuid::new_v4();
        self.viewers.insert(
            id,
            ViewerConnection {
                transport,
                divisions: HashSet::new(),
            },
        );
        ViewerRegistration {
            state: Arc::clone(self),
            id,
        }
    }

    /// Number of connected viewers following `division`.
    pub fn viewer_count(&self, division: Division) -> usize {
        self.viewers
            .iter()
            .filter(|entry| entry.divisions.contains(&division))
            .count()
    }

    /// Run `work` while holding the persistence lock so only one spreadsheet call
    /// is in flight at a time.
    ///
    /// Both waiting for the lock and the work itself are bounded by the configured
    /// lock timeout; either elapsing yields [`ServiceError::Timeout`].
    pub async fn run_exclusive<F, Fut, T>(
        &self,
        operation: &'static str,
        work: F,
    ) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let limit = self.config.persistence_lock_timeout();
        let Ok(gate) = timeout(limit, self.persistence_gate.lock()).await else {
            warn!(operation, "timed out waiting for the persistence lock");
            return Err(ServiceError::Timeout);
        };

        let outcome = match timeout(limit, work()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, "spreadsheet call exceeded the persistence time limit");
                Err(ServiceError::Timeout)
            }
        };
        drop(gate);
        outcome
    }
}

/// Registry entry of a live viewer connection.
pub struct ViewerRegistration {
    state: SharedState,
    id: Uuid,
}

impl ViewerRegistration {
    /// Registry key of this viewer, used in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Record that this viewer now follows `division`.
    pub fn follow(&self, division: Division) {
        if let Some(mut entry) = self.state.viewers.get_mut(&self.id) {
            entry.divisions.insert(division);
        }
    }
}

impl Drop for ViewerRegistration {
    fn drop(&mut self) {
        self.state.viewers.remove(&self.id);
    }
}
