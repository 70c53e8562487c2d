use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{post, put},
};
use axum_valid::Valid;

use crate::{
    dto::{
        admin::{
            ActionResponse, ImportCsvRequest, ImportErrorSummary, ImportReport,
            SetCompetitionNameRequest, UpdateScoreRequest,
        },
        common::CompetitionSnapshot,
    },
    error::AppError,
    services::{persistence_service, scoreboard_service},
    state::{
        SharedState,
        division::{Apparatus, Division},
    },
};

/// Operator endpoints for entering scores and talking to the spreadsheet.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/{division}/import", post(import_csv))
        .route(
            "/admin/{division}/competitors/{id}/scores/{apparatus}",
            put(update_score),
        )
        .route("/admin/{division}/name", put(set_competition_name))
        .route("/admin/{division}/save", post(save))
        .route("/admin/{division}/finalize", post(finalize))
        .route("/admin/{division}/reload", post(reload))
}

/// Replace every competitor of a division with the rows of a CSV file.
#[utoipa::path(
    post,
    path = "/admin/{division}/import",
    tag = "admin",
    params(("division" = Division, Path, description = "`women` or `men`")),
    request_body = ImportCsvRequest,
    responses((status = 200, description = "Imported rows and rejected lines", body = ImportReport))
)]
pub async fn import_csv(
    State(state): State<SharedState>,
    Path(division): Path<Division>,
    Valid(Json(payload)): Valid<Json<ImportCsvRequest>>,
) -> Result<Json<ImportReport>, AppError> {
    let outcome = scoreboard_service::apply_csv_import(&state, division, &payload).await?;
    Ok(Json(ImportReport {
        imported: outcome.imported,
        errors: outcome.errors.iter().map(ImportErrorSummary::from).collect(),
        snapshot: CompetitionSnapshot::from(&outcome.snapshot),
    }))
}

/// Set one apparatus score of a competitor.
#[utoipa::path(
    put,
    path = "/admin/{division}/competitors/{id}/scores/{apparatus}",
    tag = "admin",
    params(
        ("division" = Division, Path, description = "`women` or `men`"),
        ("id" = String, Path, description = "Competitor id, e.g. `w-0`"),
        ("apparatus" = Apparatus, Path, description = "Apparatus contested in the division")
    ),
    request_body = UpdateScoreRequest,
    responses(
        (status = 200, description = "Updated division state", body = CompetitionSnapshot),
        (status = 400, description = "Apparatus not contested in this division"),
        (status = 404, description = "Unknown competitor")
    )
)]
pub async fn update_score(
    State(state): State<SharedState>,
    Path((division, id, apparatus)): Path<(Division, String, Apparatus)>,
    Json(payload): Json<UpdateScoreRequest>,
) -> Result<Json<CompetitionSnapshot>, AppError> {
    let value = payload.value.map(|input| input.value()).unwrap_or(0.0);
    let snapshot =
        scoreboard_service::update_score(&state, division, &id, apparatus, value).await?;
    Ok(Json(CompetitionSnapshot::from(&snapshot)))
}

/// Rename the competition of a division.
#[utoipa::path(
    put,
    path = "/admin/{division}/name",
    tag = "admin",
    params(("division" = Division, Path, description = "`women` or `men`")),
    request_body = SetCompetitionNameRequest,
    responses((status = 200, description = "Updated division state", body = CompetitionSnapshot))
)]
pub async fn set_competition_name(
    State(state): State<SharedState>,
    Path(division): Path<Division>,
    Valid(Json(payload)): Valid<Json<SetCompetitionNameRequest>>,
) -> Result<Json<CompetitionSnapshot>, AppError> {
    let snapshot =
        scoreboard_service::set_competition_name(&state, division, &payload.name).await?;
    Ok(Json(CompetitionSnapshot::from(&snapshot)))
}

/// Push a division to the spreadsheet.
#[utoipa::path(
    post,
    path = "/admin/{division}/save",
    tag = "admin",
    params(("division" = Division, Path, description = "`women` or `men`")),
    responses(
        (status = 200, description = "Saved", body = ActionResponse),
        (status = 502, description = "Spreadsheet reported a failure"),
        (status = 503, description = "Spreadsheet unreachable, busy or not configured")
    )
)]
pub async fn save(
    State(state): State<SharedState>,
    Path(division): Path<Division>,
) -> Result<Json<ActionResponse>, AppError> {
    let message = persistence_service::save(&state, division).await?;
    Ok(Json(ActionResponse::ok(message)))
}

/// Archive the division's sheet once the competition is over.
#[utoipa::path(
    post,
    path = "/admin/{division}/finalize",
    tag = "admin",
    params(("division" = Division, Path, description = "`women` or `men`")),
    responses(
        (status = 200, description = "Archived", body = ActionResponse),
        (status = 502, description = "Spreadsheet reported a failure"),
        (status = 503, description = "Spreadsheet unreachable, busy or not configured")
    )
)]
pub async fn finalize(
    State(state): State<SharedState>,
    Path(division): Path<Division>,
) -> Result<Json<ActionResponse>, AppError> {
    let message = persistence_service::finalize(&state, division).await?;
    Ok(Json(ActionResponse::ok(message)))
}

/// Replace a division with the spreadsheet's content.
#[utoipa::path(
    post,
    path = "/admin/{division}/reload",
    tag = "admin",
    params(("division" = Division, Path, description = "`women` or `men`")),
    responses(
        (status = 200, description = "Division reloaded", body = CompetitionSnapshot),
        (status = 503, description = "Spreadsheet unreachable, busy or not configured")
    )
)]
pub async fn reload(
    State(state): State<SharedState>,
    Path(division): Path<Division>,
) -> Result<Json<CompetitionSnapshot>, AppError> {
    let snapshot = persistence_service::reload(&state, division).await?;
    Ok(Json(CompetitionSnapshot::from(&snapshot)))
}
