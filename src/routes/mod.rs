use axum::Router;

use crate::state::SharedState;

/// Operator endpoints.
pub mod admin;
/// Swagger UI.
pub mod docs;
/// Health check.
pub mod health;
/// Viewer read endpoints.
pub mod public;
/// SSE viewer streams.
pub mod sse;
/// WebSocket endpoint.
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(websocket::router())
        .merge(public::router())
        .merge(admin::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
