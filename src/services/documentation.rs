use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for the scoreboard backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::division_stream,
        crate::routes::websocket::ws_handler,
        crate::routes::public::get_state,
        crate::routes::public::get_rankings,
        crate::routes::admin::import_csv,
        crate::routes::admin::update_score,
        crate::routes::admin::set_competition_name,
        crate::routes::admin::save,
        crate::routes::admin::finalize,
        crate::routes::admin::reload,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
            crate::dto::ws::Ack,
            crate::dto::common::CompetitionSnapshot,
            crate::dto::admin::ImportReport,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "realtime", description = "SSE and WebSocket synchronization channels"),
        (name = "public", description = "Read-only scoreboard views"),
        (name = "admin", description = "Score entry and spreadsheet operations"),
    )
)]
pub struct ApiDoc;
