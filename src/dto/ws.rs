use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        admin::{FirstLine, ImportCsvRequest, ImportReport, ScoreInput, SetCompetitionNameRequest},
        common::CompetitionSnapshot,
        validation::validate_competitor_id,
    },
    state::division::{Apparatus, Division},
};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
/// Messages accepted from operator and viewer WebSocket clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to a division; answered with its current state.
    RequestInitialState {
        /// Division to follow.
        division: Division,
    },
    /// Replace the division with the rows of a CSV file; answered with `import_report`.
    ImportCsv {
        /// Target division.
        division: Division,
        /// File contents.
        csv: String,
        /// How the first non-blank line is read.
        #[serde(default)]
        first_line: FirstLine,
    },
    /// Set one apparatus score; `null` or a missing value clears it.
    UpdateScore {
        /// Target division.
        division: Division,
        /// Stable competitor id, e.g. `w-0`.
        competitor_id: String,
        /// Apparatus to score.
        apparatus: Apparatus,
        /// New score.
        #[serde(default)]
        value: Option<ScoreInput>,
    },
    /// Rename the competition.
    SetCompetitionName {
        /// Target division.
        division: Division,
        /// New title.
        name: String,
    },
    /// Push the division to the spreadsheet.
    Save {
        /// Division to save.
        division: Division,
    },
    /// Archive the division's sheet.
    Finalize {
        /// Division to archive.
        division: Division,
    },
}

/// Why an inbound frame was refused before reaching the services.
#[derive(Debug, Error)]
pub enum ClientMessageError {
    /// Not JSON, or not a known message shape.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    /// Well-formed but failed validation.
    #[error("invalid message: {0}")]
    Invalid(#[from] ValidationErrors),
}

impl ClientMessage {
    /// Parse and validate a text frame.
    pub fn from_json_str(text: &str) -> Result<Self, ClientMessageError> {
        let message: Self = serde_json::from_str(text)?;
        message.validate()?;
        Ok(message)
    }

    /// Wire name of the request, echoed back in acknowledgements.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestInitialState { .. } => "request_initial_state",
            Self::ImportCsv { .. } => "import_csv",
            Self::UpdateScore { .. } => "update_score",
            Self::SetCompetitionName { .. } => "set_competition_name",
            Self::Save { .. } => "save",
            Self::Finalize { .. } => "finalize",
        }
    }

    /// Division the request targets.
    pub fn division(&self) -> Division {
        match self {
            Self::RequestInitialState { division }
            | Self::ImportCsv { division, .. }
            | Self::UpdateScore { division, .. }
            | Self::SetCompetitionName { division, .. }
            | Self::Save { division }
            | Self::Finalize { division } => *division,
        }
    }
}

impl Validate for ClientMessage {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::ImportCsv {
                csv, first_line, ..
            } => ImportCsvRequest {
                csv: csv.clone(),
                first_line: *first_line,
            }
            .validate(),
            Self::SetCompetitionName { name, .. } => {
                SetCompetitionNameRequest { name: name.clone() }.validate()
            }
            Self::UpdateScore { competitor_id, .. } => {
                let mut errors = ValidationErrors::new();
                if let Err(err) = validate_competitor_id(competitor_id) {
                    errors.add("competitor_id", err);
                }
                if errors.is_empty() {
                    Ok(())
                } else {
                    Err(errors)
                }
            }
            Self::RequestInitialState { .. } | Self::Save { .. } | Self::Finalize { .. } => Ok(()),
        }
    }
}

/// Reply to a request that does not itself produce a state frame.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Ack {
    /// Wire name of the acknowledged request (`save`, `update_score`, ...).
    pub request: String,
    /// Division the request targeted; absent when the frame could not be parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub division: Option<Division>,
    /// Whether the request was applied.
    pub success: bool,
    /// Human-readable outcome for the operator.
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
/// Messages pushed to WebSocket clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full state of a division, after every change and on subscription.
    StateChanged(CompetitionSnapshot),
    /// Outcome of a request that does not produce a state frame.
    Ack(Ack),
    /// Sent to the importing client only.
    ImportReport(ImportReport),
}
