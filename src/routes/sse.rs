use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;

use crate::{
    services::sse_service,
    state::{SharedState, division::Division},
};

#[utoipa::path(
    get,
    path = "/sse/{division}",
    tag = "realtime",
    params(("division" = Division, Path, description = "`women` or `men`")),
    responses((status = 200, description = "Full-state frames of one division, current state first", content_type = "text/event-stream", body = String))
)]
/// Stream every state change of a division to a viewer.
pub async fn division_stream(
    State(state): State<SharedState>,
    Path(division): Path<Division>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sse_service::subscribe(&state, division).await
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/{division}", get(division_stream))
}
