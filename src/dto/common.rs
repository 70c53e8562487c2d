use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::format_system_time,
    state::{
        competition::Competitor,
        division::Division,
        store::{StateSnapshot, StateStore},
    },
};

/// Competitor as shown to viewers and operators.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq)]
pub struct CompetitorSummary {
    /// Stable competitor id, e.g. `w-0`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Skill tier.
    pub class: String,
    /// Rotation group.
    pub group: String,
    /// Scores keyed by apparatus, in the division's apparatus order.
    #[schema(value_type = HashMap<String, f64>)]
    pub scores: IndexMap<String, f64>,
    /// Sum of all scores.
    pub total: f64,
}

impl From<&Competitor> for CompetitorSummary {
    fn from(competitor: &Competitor) -> Self {
        Self {
            id: competitor.id.clone(),
            name: competitor.name.clone(),
            class: competitor.class.clone(),
            group: competitor.group.clone(),
            scores: competitor
                .scores()
                .iter()
                .map(|(apparatus, score)| (apparatus.as_str().to_string(), *score))
                .collect(),
            total: competitor.total(),
        }
    }
}

/// Full state of one division, pushed to viewers after every change.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq)]
pub struct CompetitionSnapshot {
    /// Division the state belongs to.
    pub division: Division,
    /// Increases by one with every applied change; stale frames can be dropped.
    pub revision: u64,
    /// Competition title.
    pub competition_name: String,
    /// Apparatus scored in this division, in column order.
    pub apparatus: Vec<String>,
    /// Competitors in entry order.
    pub competitors: Vec<CompetitorSummary>,
    /// RFC 3339 timestamp of the last change, absent until the first one.
    pub last_updated: Option<String>,
}

impl From<&StateSnapshot> for CompetitionSnapshot {
    fn from(snapshot: &StateSnapshot) -> Self {
        Self {
            division: snapshot.division,
            revision: snapshot.revision,
            competition_name: snapshot.state.competition_name.clone(),
            apparatus: snapshot
                .division
                .apparatus()
                .iter()
                .map(|apparatus| apparatus.as_str().to_string())
                .collect(),
            competitors: snapshot
                .state
                .competitors()
                .map(CompetitorSummary::from)
                .collect(),
            last_updated: snapshot.state.last_updated().map(format_system_time),
        }
    }
}

impl CompetitionSnapshot {
    /// Capture the current state of `division`.
    pub async fn capture(store: &StateStore, division: Division) -> Self {
        Self::from(&store.snapshot(division).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{competition::CompetitionState, division::Apparatus};

    #[test]
    fn snapshot_keeps_apparatus_order_and_formats_timestamp() {
        let mut state = CompetitionState::new(
            "Cup",
            vec![Competitor::new(
                Division::Men,
                "m-0",
                "Ken",
                "上級",
                "1組",
                [(Apparatus::Hbar, 9.0), (Apparatus::Floor, 8.0)],
            )],
        );
        state.touch();
        let dto = CompetitionSnapshot::from(&StateSnapshot {
            division: Division::Men,
            revision: 4,
            state,
        });

        let keys: Vec<&str> = dto.competitors[0].scores.keys().map(String::as_str).collect();
        assert_eq!(keys, ["floor", "pommel", "rings", "vault", "pbars", "hbar"]);
        assert_eq!(dto.apparatus, keys);
        assert_eq!(dto.competitors[0].total, 17.0);
        assert_eq!(dto.revision, 4);
        assert!(dto.last_updated.as_ref().is_some_and(|stamp| stamp.contains('T')));

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["division"], "men");
        assert_eq!(json["competitors"][0]["scores"]["hbar"], 9.0);
    }
}
