use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::sheet_bridge::SheetBridge,
    services::persistence_service,
    state::{SharedState, division::Division},
};

/// Timing of the startup load.
#[derive(Debug, Clone, Copy)]
pub struct StartupSchedule {
    /// Wait before the first division is requested.
    pub initial_delay: Duration,
    /// Pause between two divisions, so the script is not hit twice at once.
    pub division_pause: Duration,
    /// Load attempts per division.
    pub attempts: u32,
    /// First retry delay; doubled after every failure.
    pub retry_delay: Duration,
}

impl Default for StartupSchedule {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(3),
            division_pause: Duration::from_secs(1),
            attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Install the spreadsheet bridge and restore every division from it.
///
/// Without a bridge the server stays in degraded mode with empty divisions. A
/// division whose load keeps failing also starts empty.
pub async fn run(
    state: SharedState,
    bridge: Option<Arc<dyn SheetBridge>>,
    schedule: StartupSchedule,
) {
    let Some(bridge) = bridge else {
        warn!("no spreadsheet bridge configured; running in degraded mode");
        return;
    };

    state.install_sheet_bridge(bridge).await;
    info!("spreadsheet bridge installed; leaving degraded mode");

    sleep(schedule.initial_delay).await;
    for (position, division) in Division::ALL.into_iter().enumerate() {
        if position > 0 {
            sleep(schedule.division_pause).await;
        }

        match persistence_service::reload_with_retry(
            &state,
            division,
            schedule.attempts,
            schedule.retry_delay,
        )
        .await
        {
            Ok(snapshot) => info!(
                %division,
                competitors = snapshot.state.competitors().len(),
                "division restored at startup"
            ),
            Err(err) => warn!(
                %division,
                error = %err,
                "exhausted spreadsheet load attempts; division starts empty"
            ),
        }
    }
}
