use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    dto::common::CompetitorSummary,
    state::{competition::Metric, division::Division},
};

/// Query string of `GET /public/{division}/rankings`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RankingQuery {
    /// Class to rank; defaults to the first class in display order.
    pub class: Option<String>,
    /// `total` (default) or an apparatus name.
    #[serde(default)]
    #[param(value_type = Option<String>)]
    pub metric: Metric,
    /// Only return rows whose name contains this text; ranks are unaffected.
    pub search: Option<String>,
}

/// One line of a ranking table.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RankedRowSummary {
    /// 1-based competition rank; ties share a rank.
    pub rank: usize,
    /// Value the row was ranked by.
    pub metric: f64,
    /// Ranked competitor.
    pub competitor: CompetitorSummary,
}

/// Ranking table of one class, plus the classes a viewer can switch to.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RankingResponse {
    /// Ranked division.
    pub division: Division,
    /// Revision of the state the table was computed from.
    pub revision: u64,
    /// Competition title.
    pub competition_name: String,
    /// Every class of the division, in display order.
    pub classes: Vec<String>,
    /// Ranked class, absent when the division has no competitors.
    pub class: Option<String>,
    /// Metric the table is sorted by.
    #[schema(value_type = String)]
    pub metric: Metric,
    /// Rows of the ranked class, best first.
    pub rows: Vec<RankedRowSummary>,
    /// RFC 3339 timestamp of the last change.
    pub last_updated: Option<String>,
}
