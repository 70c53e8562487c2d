use tracing::debug;

use crate::{
    dto::health::{HealthResponse, HealthStatus, ViewerCounts},
    state::{SharedState, division::Division},
};

/// Report degraded mode and the number of connected viewers per division.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let status = if state.is_degraded().await {
        debug!("health requested while no spreadsheet bridge is configured");
        HealthStatus::Degraded
    } else {
        HealthStatus::Ok
    };

    HealthResponse {
        status,
        viewers: ViewerCounts {
            women: state.viewer_count(Division::Women),
            men: state.viewer_count(Division::Men),
        },
    }
}
