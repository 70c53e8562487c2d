use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::models::SheetDocument,
    error::ServiceError,
    state::{SharedState, division::Division, store::StateSnapshot},
};

const MAX_JITTER_MS: u64 = 250;

/// Push the current state of `division` to the spreadsheet.
///
/// The state is captured after the persistence lock is taken, so the sheet
/// receives the newest state even when the call had to wait. Never retried.
pub async fn save(state: &SharedState, division: Division) -> Result<String, ServiceError> {
    let bridge = state.sheet_bridge().await.ok_or(ServiceError::Degraded)?;

    state
        .run_exclusive("save", || async move {
            let snapshot = state.store().snapshot(division).await;
            let document = SheetDocument::from_state(division, &snapshot.state);
            let rows = document.rows.len();
            bridge.save(division, document).await?;
            info!(%division, rows, revision = snapshot.revision, "division saved to spreadsheet");
            Ok(format!("saved {rows} competitors to the spreadsheet"))
        })
        .await
}

/// Replace `division` with the spreadsheet's content and broadcast it.
pub async fn reload(state: &SharedState, division: Division) -> Result<StateSnapshot, ServiceError> {
    let bridge = state.sheet_bridge().await.ok_or(ServiceError::Degraded)?;

    state
        .run_exclusive("load", || async move {
            let sheet = bridge.load(division).await?;
            let loaded = sheet.into_state(division, state.config().row_defaults());
            let ((), snapshot) = state
                .store()
                .mutate(division, move |current| {
                    *current = loaded;
                    Ok(())
                })
                .await?;
            info!(
                %division,
                competitors = snapshot.state.competitors().len(),
                revision = snapshot.revision,
                "division loaded from spreadsheet"
            );
            Ok(snapshot)
        })
        .await
}

/// [`reload`] with up to `attempts` tries, doubling `delay` (plus jitter) between them.
///
/// Degraded mode is not retried.
pub async fn reload_with_retry(
    state: &SharedState,
    division: Division,
    attempts: u32,
    delay: Duration,
) -> Result<StateSnapshot, ServiceError> {
    let mut backoff = delay;
    let mut attempt = 1;

    loop {
        match reload(state, division).await {
            Ok(snapshot) => return Ok(snapshot),
            Err(ServiceError::Degraded) => return Err(ServiceError::Degraded),
            Err(err) if attempt >= attempts => return Err(err),
            Err(err) => {
                warn!(%division, attempt, error = %err, "spreadsheet load attempt failed");
                let jitter = Duration::from_millis(rand::rng().random_range(0..=MAX_JITTER_MS));
                sleep(backoff + jitter).await;
                backoff *= 2;
                attempt += 1;
            }
        }
    }
}

/// Ask the spreadsheet to archive `division` once the competition is over.
pub async fn finalize(state: &SharedState, division: Division) -> Result<String, ServiceError> {
    let bridge = state.sheet_bridge().await.ok_or(ServiceError::Degraded)?;

    state
        .run_exclusive("archive", || async move {
            let message = bridge.archive(division).await?;
            info!(%division, "division archived in spreadsheet");
            Ok(message.unwrap_or_else(|| format!("{division} results archived")))
        })
        .await
}
