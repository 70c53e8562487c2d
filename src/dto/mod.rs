use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Operator request and response bodies.
pub mod admin;
/// Snapshot shapes shared by every transport.
pub mod common;
/// Health check body.
pub mod health;
/// Viewer ranking query and table.
pub mod public;
/// SSE frame helpers.
pub mod sse;
/// Custom validators.
pub mod validation;
/// WebSocket message shapes.
pub mod ws;

/// RFC 3339 rendering of `time`, used for `last_updated` fields.
pub(crate) fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
