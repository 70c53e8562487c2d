//! Explicit column layout of a competitor row, shared by CSV import and the
//! spreadsheet bridge: `class, group, (reserved), name, <one score per apparatus>`.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::{
    config::RowDefaults,
    state::{
        competition::{CompetitionState, Competitor, parse_score, round_score, sanitize_score},
        division::{Apparatus, Division},
    },
};

/// Version of the row layout below; bump whenever a column moves.
pub const SHEET_LAYOUT_VERSION: u32 = 1;
/// Column holding the competitor class.
pub const CLASS_COLUMN: usize = 0;
/// Column holding the rotation group.
pub const GROUP_COLUMN: usize = 1;
/// Column kept blank for the sheet's own use.
pub const RESERVED_COLUMN: usize = 2;
/// Column holding the competitor name.
pub const NAME_COLUMN: usize = 3;
/// First apparatus score column; the others follow in division order.
pub const FIRST_SCORE_COLUMN: usize = 4;

/// Number of columns a complete row of `division` has.
pub fn column_count(division: Division) -> usize {
    FIRST_SCORE_COLUMN + division.apparatus().len()
}

/// Reasons a row of text cells cannot become a [`SheetRow`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SheetRowError {
    /// Fewer cells than the division layout requires.
    #[error("not enough columns (expected at least {expected}, found {found})")]
    TooFewColumns {
        /// Columns a complete row has.
        expected: usize,
        /// Columns present on the line.
        found: usize,
    },
    /// Class, group or name is blank.
    #[error("class, group or name is empty")]
    MissingField,
}

/// One competitor laid out in sheet column order.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// Competitor class.
    pub class: String,
    /// Rotation group.
    pub group: String,
    /// Competitor name.
    pub name: String,
    /// Scores in the division's apparatus order.
    pub scores: Vec<f64>,
}

impl SheetRow {
    /// Lay out `competitor` using the apparatus order of `division`.
    pub fn from_competitor(division: Division, competitor: &Competitor) -> Self {
        Self {
            class: competitor.class.clone(),
            group: competitor.group.clone(),
            name: competitor.name.clone(),
            scores: division
                .apparatus()
                .iter()
                .map(|apparatus| competitor.score(*apparatus))
                .collect(),
        }
    }

    /// Parse a row of text cells.
    ///
    /// Purely numeric groups get `group_suffix` appended and unreadable score
    /// cells count as `0`. Cells past the last score column are ignored.
    pub fn from_text_cells(
        division: Division,
        cells: &[&str],
        group_suffix: &str,
    ) -> Result<Self, SheetRowError> {
        let expected = column_count(division);
        if cells.len() < expected {
            return Err(SheetRowError::TooFewColumns {
                expected,
                found: cells.len(),
            });
        }

        let class = cells[CLASS_COLUMN].trim().to_string();
        let mut group = cells[GROUP_COLUMN].trim().to_string();
        if !group.is_empty() && group.chars().all(|c| c.is_ascii_digit()) {
            group.push_str(group_suffix);
        }
        let name = cells[NAME_COLUMN].trim().to_string();
        if class.is_empty() || group.is_empty() || name.is_empty() {
            return Err(SheetRowError::MissingField);
        }

        let scores = cells[FIRST_SCORE_COLUMN..expected]
            .iter()
            .map(|cell| parse_score(cell))
            .collect();

        Ok(Self {
            class,
            group,
            name,
            scores,
        })
    }

    /// Turn the row into a competitor carrying the given stable id.
    pub fn into_competitor(self, division: Division, id: String) -> Competitor {
        let scores = division.apparatus().iter().copied().zip(self.scores);
        Competitor::new(division, id, self.name, self.class, self.group, scores)
    }

    /// JSON cells in column order, as expected by the spreadsheet bridge.
    pub fn to_cells(&self) -> Vec<Value> {
        let mut cells = vec![Value::Null; FIRST_SCORE_COLUMN];
        cells[CLASS_COLUMN] = Value::from(self.class.as_str());
        cells[GROUP_COLUMN] = Value::from(self.group.as_str());
        cells[RESERVED_COLUMN] = Value::from("");
        cells[NAME_COLUMN] = Value::from(self.name.as_str());
        cells.extend(self.scores.iter().map(|score| Value::from(*score)));
        cells
    }
}

/// Everything written to the spreadsheet for one division.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetDocument {
    /// Competition title, stored as its own key.
    pub competition_name: String,
    /// One row per competitor, in entry order.
    pub rows: Vec<SheetRow>,
}

impl SheetDocument {
    /// Serialize `state` into the sheet layout of `division`.
    pub fn from_state(division: Division, state: &CompetitionState) -> Self {
        Self {
            competition_name: state.competition_name.clone(),
            rows: state
                .competitors()
                .map(|competitor| SheetRow::from_competitor(division, competitor))
                .collect(),
        }
    }
}

/// Competitor as read back from the spreadsheet; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedCompetitor {
    /// Competitor name.
    pub name: Option<String>,
    /// Competitor class.
    pub class: Option<String>,
    /// Rotation group.
    pub group: Option<String>,
    /// Scores keyed by apparatus wire name.
    pub scores: HashMap<String, Value>,
    /// Total as stored by the sheet; only used for diagnostics.
    pub total: Option<f64>,
}

/// Division contents read back from the spreadsheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedSheet {
    /// Competition title.
    pub competition_name: String,
    /// Competitors in sheet row order.
    pub competitors: Vec<LoadedCompetitor>,
}

impl LoadedSheet {
    /// Rebuild the division state.
    ///
    /// Ids derive from row position, blank fields take `defaults`, and totals are
    /// always recomputed from the scores.
    pub fn into_state(self, division: Division, defaults: &RowDefaults) -> CompetitionState {
        let competitors = self
            .competitors
            .into_iter()
            .enumerate()
            .map(|(index, loaded)| {
                let scores = loaded
                    .scores
                    .iter()
                    .filter_map(|(key, value)| {
                        let apparatus = key.parse::<Apparatus>().ok()?;
                        Some((apparatus, score_from_value(value)))
                    })
                    .collect::<Vec<_>>();
                let competitor = Competitor::new(
                    division,
                    division.competitor_id(index),
                    non_blank(loaded.name).unwrap_or_else(|| defaults.name.clone()),
                    non_blank(loaded.class).unwrap_or_else(|| defaults.class.clone()),
                    non_blank(loaded.group).unwrap_or_else(|| defaults.group.clone()),
                    scores,
                );
                if let Some(stored) = loaded.total {
                    if round_score(stored) != competitor.total() {
                        debug!(
                            %division,
                            competitor_id = %competitor.id,
                            stored,
                            computed = competitor.total(),
                            "ignoring stale stored total"
                        );
                    }
                }
                competitor
            })
            .collect();

        CompetitionState::new(self.competition_name, competitors)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn score_from_value(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().map(sanitize_score).unwrap_or(0.0),
        Value::String(raw) => parse_score(raw),
        _ => 0.0,
    }
}
