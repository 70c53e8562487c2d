use serde::Serialize;

use crate::dto::common::CompetitionSnapshot;

/// Event name carried by every full-state frame.
pub const STATE_CHANGED_EVENT: &str = "state_changed";

/// A serialized SSE frame: event name plus JSON data line.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    /// SSE `event` field.
    pub event: &'static str,
    /// JSON payload.
    pub data: String,
}

impl ServerEvent {
    /// Serialize `payload` as the data of an `event` frame.
    pub fn json<T: Serialize>(event: &'static str, payload: &T) -> serde_json::Result<Self> {
        Ok(Self {
            event,
            data: serde_json::to_string(payload)?,
        })
    }

    /// Full-state frame sent on connect and after every change.
    pub fn state_changed(snapshot: &CompetitionSnapshot) -> serde_json::Result<Self> {
        Self::json(STATE_CHANGED_EVENT, snapshot)
    }
}
