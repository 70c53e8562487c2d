//! Library crate for gym-score-back, exposing modules for binaries and integration tests.

/// Application configuration.
pub mod config;
/// Spreadsheet persistence.
pub mod dao;
/// Wire types.
pub mod dto;
/// Service and HTTP errors.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Business operations behind the routes.
pub mod services;
/// Shared in-memory state.
pub mod state;
