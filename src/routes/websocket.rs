use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::Response,
    routing::get,
};

use crate::{services::websocket_service, state::SharedState};

/// Realtime channel shared by operator consoles and viewer dashboards.
pub fn router() -> Router<SharedState> {
    Router::new().route("/ws", get(ws_handler))
}

#[utoipa::path(
    get,
    path = "/ws",
    tag = "realtime",
    responses((status = 101, description = "Switching protocols to WebSocket"))
)]
/// Upgrade to a WebSocket session. Nothing is pushed until the client sends
/// `request_initial_state` for a division.
pub async fn ws_handler(State(state): State<SharedState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| websocket_service::handle_socket(state, socket))
}
