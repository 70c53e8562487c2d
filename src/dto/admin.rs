//! DTO definitions used by the operator REST API, the WebSocket channel and the
//! documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::common::CompetitionSnapshot,
    services::csv_import::RowError,
    state::competition::{parse_score, sanitize_score},
};

/// How the first line of an imported CSV file is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FirstLine {
    /// Column titles; skipped.
    #[default]
    Header,
    /// First cell holds the competition name.
    CompetitionName,
}

/// Raw CSV text replacing every competitor of a division.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct ImportCsvRequest {
    /// File contents, one competitor per line.
    #[validate(length(min = 1, message = "CSV text must not be empty"))]
    pub csv: String,
    /// How the first non-blank line is read.
    #[serde(default)]
    pub first_line: FirstLine,
}

/// Score as typed by the operator: a JSON number or the raw input text.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ScoreInput {
    /// Numeric JSON value.
    Number(f64),
    /// Raw text, parsed leniently.
    Text(String),
}

impl ScoreInput {
    /// Score to store; unreadable input counts as `0`.
    pub fn value(&self) -> f64 {
        match self {
            ScoreInput::Number(value) => sanitize_score(*value),
            ScoreInput::Text(raw) => parse_score(raw),
        }
    }
}

/// New value of one apparatus score; `null` or a missing value clears it to `0`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateScoreRequest {
    #[serde(default)]
    /// Score to store.
    pub value: Option<ScoreInput>,
}

/// New competition title.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct SetCompetitionNameRequest {
    /// Title shown on every dashboard.
    #[validate(length(max = 200, message = "Competition name is too long"))]
    pub name: String,
}

/// Generic action acknowledgement used by operator endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Whether the action was applied.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
}

impl ActionResponse {
    /// Successful outcome carrying `message`.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// A CSV line that could not be imported.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ImportErrorSummary {
    /// 1-based line number in the submitted file.
    pub line_number: usize,
    pub message: String,
}

impl From<&RowError> for ImportErrorSummary {
    fn from(error: &RowError) -> Self {
        Self {
            line_number: error.line_number,
            message: error.reason.to_string(),
        }
    }
}

/// Outcome of a CSV import: the resulting state plus every rejected line.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImportReport {
    /// Competitors created from the file.
    pub imported: usize,
    pub errors: Vec<ImportErrorSummary>,
    pub snapshot: CompetitionSnapshot,
}
