//! Operator mutations of a division. Every successful change is broadcast by the
//! store to all subscribers of the division.

use tracing::{info, warn};

use crate::{
    dto::admin::ImportCsvRequest,
    error::ServiceError,
    services::{
        csv_import::{RowError, parse_csv},
        persistence_service,
    },
    state::{
        SharedState,
        division::{Apparatus, Division},
        store::StateSnapshot,
    },
};

/// What a CSV import did.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// Competitors created; `0` means the division was left untouched.
    pub imported: usize,
    /// Lines that were rejected, in file order.
    pub errors: Vec<RowError>,
    /// Division state after the import.
    pub snapshot: StateSnapshot,
}

/// Current state of `division`.
pub async fn get_state(state: &SharedState, division: Division) -> StateSnapshot {
    state.store().snapshot(division).await
}

/// Replace every competitor of `division` with the rows of a CSV file.
///
/// Rejected lines are returned alongside the new state. When no line is usable
/// the division keeps its current competitors.
pub async fn apply_csv_import(
    state: &SharedState,
    division: Division,
    request: &ImportCsvRequest,
) -> Result<ImportOutcome, ServiceError> {
    let parsed = parse_csv(
        division,
        &request.csv,
        request.first_line,
        state.config().group_suffix(),
    );

    if parsed.rows.is_empty() {
        warn!(
            %division,
            errors = parsed.errors.len(),
            "CSV import produced no competitors; keeping current state"
        );
        return Ok(ImportOutcome {
            imported: 0,
            errors: parsed.errors,
            snapshot: state.store().snapshot(division).await,
        });
    }

    let competition_name = parsed.competition_name;
    let rows = parsed.rows;
    let (imported, snapshot) = state
        .store()
        .mutate(division, move |current| {
            let competitors = rows
                .into_iter()
                .enumerate()
                .map(|(index, row)| row.into_competitor(division, division.competitor_id(index)))
                .collect::<Vec<_>>();
            let imported = competitors.len();
            current.replace_competitors(competitors);
            if let Some(name) = competition_name {
                current.competition_name = name;
            }
            Ok(imported)
        })
        .await?;

    info!(
        %division,
        imported,
        errors = parsed.errors.len(),
        revision = snapshot.revision,
        "CSV import applied"
    );

    if state.config().auto_save_on_import() && !state.is_degraded().await {
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(err) = persistence_service::save(&state, division).await {
                warn!(%division, error = %err, "automatic save after import failed");
            }
        });
    }

    Ok(ImportOutcome {
        imported,
        errors: parsed.errors,
        snapshot,
    })
}

/// Set one apparatus score of a competitor and recompute the total.
///
/// Unknown competitors yield [`ServiceError::NotFound`]; this usually means the
/// operator's view is stale.
pub async fn update_score(
    state: &SharedState,
    division: Division,
    competitor_id: &str,
    apparatus: Apparatus,
    value: f64,
) -> Result<StateSnapshot, ServiceError> {
    if !division.scores(apparatus) {
        return Err(ServiceError::InvalidInput(format!(
            "{apparatus} is not contested in the {division} division"
        )));
    }

    let result = state
        .store()
        .mutate(division, |current| {
            let competitor = current.competitor_mut(competitor_id).ok_or_else(|| {
                ServiceError::NotFound(format!("competitor `{competitor_id}` not found"))
            })?;
            competitor.set_score(apparatus, value);
            Ok(())
        })
        .await;

    match result {
        Ok(((), snapshot)) => Ok(snapshot),
        Err(err @ ServiceError::NotFound(_)) => {
            warn!(%division, competitor_id, %apparatus, "score update for unknown competitor ignored");
            Err(err)
        }
        Err(err) => Err(err),
    }
}

/// Rename the competition of `division`.
pub async fn set_competition_name(
    state: &SharedState,
    division: Division,
    name: &str,
) -> Result<StateSnapshot, ServiceError> {
    let name = name.trim().to_string();
    let ((), snapshot) = state
        .store()
        .mutate(division, move |current| {
            current.competition_name = name;
            Ok(())
        })
        .await?;
    Ok(snapshot)
}
