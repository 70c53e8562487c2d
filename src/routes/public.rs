use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::{
        common::CompetitionSnapshot,
        public::{RankingQuery, RankingResponse},
    },
    error::AppError,
    services::{ranking_service, scoreboard_service},
    state::{SharedState, division::Division},
};

/// Public read-only endpoints used by viewer dashboards.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/public/{division}/state", get(get_state))
        .route("/public/{division}/rankings", get(get_rankings))
}

#[utoipa::path(
    get,
    path = "/public/{division}/state",
    tag = "public",
    params(("division" = Division, Path, description = "`women` or `men`")),
    responses((status = 200, description = "Current state of the division", body = CompetitionSnapshot))
)]
/// Return the full current state of a division.
pub async fn get_state(
    State(state): State<SharedState>,
    Path(division): Path<Division>,
) -> Json<CompetitionSnapshot> {
    let snapshot = scoreboard_service::get_state(&state, division).await;
    Json(CompetitionSnapshot::from(&snapshot))
}

#[utoipa::path(
    get,
    path = "/public/{division}/rankings",
    tag = "public",
    params(
        ("division" = Division, Path, description = "`women` or `men`"),
        RankingQuery
    ),
    responses(
        (status = 200, description = "Ranking table of one class", body = RankingResponse),
        (status = 400, description = "Metric is not contested in this division")
    )
)]
/// Rank one class of a division by total or by a single apparatus.
pub async fn get_rankings(
    State(state): State<SharedState>,
    Path(division): Path<Division>,
    Query(query): Query<RankingQuery>,
) -> Result<Json<RankingResponse>, AppError> {
    let payload = ranking_service::rankings(&state, division, query).await?;
    Ok(Json(payload))
}
