/// CSV parsing for operator imports.
pub mod csv_import;
/// Change frames of one division subscription.
pub mod division_feed;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Spreadsheet save, load and archive behind the persistence lock.
pub mod persistence_service;
/// Ranking projections for viewers.
pub mod ranking_service;
/// Operator mutations of a division.
pub mod scoreboard_service;
/// Server-Sent Events viewer streams.
pub mod sse_service;
/// Spreadsheet bridge installation and startup load.
pub mod storage_supervisor;
/// WebSocket connection and message handling service.
pub mod websocket_service;
