use std::{fmt, str::FromStr, time::SystemTime};

use indexmap::IndexMap;
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::state::division::{Apparatus, Division, UnknownName};

/// Largest absolute value accepted for one apparatus score.
///
/// Keeps every score and total far from `f64` overflow; real scores stay below 20.
pub const MAX_SCORE_MAGNITUDE: f64 = 1_000.0;

/// Round a score to thousandths, the precision judges enter scores with.
///
/// Values too large to scale are returned unchanged.
pub fn round_score(value: f64) -> f64 {
    let scaled = (value * 1000.0).round();
    if scaled.is_finite() {
        scaled / 1000.0
    } else {
        value
    }
}

/// Coerce a raw number into a usable score: anything non-finite or beyond
/// [`MAX_SCORE_MAGNITUDE`] becomes `0`.
pub fn sanitize_score(value: f64) -> f64 {
    if value.is_finite() && value.abs() <= MAX_SCORE_MAGNITUDE {
        round_score(value)
    } else {
        0.0
    }
}

/// Parse a user-entered score cell, defaulting to `0` when it is not a number.
pub fn parse_score(raw: &str) -> f64 {
    raw.trim().parse::<f64>().map(sanitize_score).unwrap_or(0.0)
}

/// A gymnast entered in one division.
///
/// `total` is derived from `scores` and is recomputed by every mutation; it is
/// never set independently.
#[derive(Debug, Clone, PartialEq)]
pub struct Competitor {
    /// Stable identifier, assigned once when the competitor is created.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Skill tier (ranked separately).
    pub class: String,
    /// Rotation group inside the class.
    pub group: String,
    scores: IndexMap<Apparatus, f64>,
    total: f64,
}

impl Competitor {
    /// Build a competitor with one score slot per apparatus of `division`.
    ///
    /// Missing apparatus start at `0`; scores for apparatus the division does not
    /// contest are dropped.
    pub fn new(
        division: Division,
        id: impl Into<String>,
        name: impl Into<String>,
        class: impl Into<String>,
        group: impl Into<String>,
        scores: impl IntoIterator<Item = (Apparatus, f64)>,
    ) -> Self {
        let mut slots: IndexMap<Apparatus, f64> = division
            .apparatus()
            .iter()
            .map(|apparatus| (*apparatus, 0.0))
            .collect();
        for (apparatus, value) in scores {
            if let Some(slot) = slots.get_mut(&apparatus) {
                *slot = sanitize_score(value);
            }
        }

        let mut competitor = Self {
            id: id.into(),
            name: name.into(),
            class: class.into(),
            group: group.into(),
            scores: slots,
            total: 0.0,
        };
        competitor.recompute_total();
        competitor
    }

    /// Score for `apparatus`, `0` when it has not been entered.
    pub fn score(&self, apparatus: Apparatus) -> f64 {
        self.scores.get(&apparatus).copied().unwrap_or(0.0)
    }

    /// Every score slot in division column order.
    pub fn scores(&self) -> &IndexMap<Apparatus, f64> {
        &self.scores
    }

    /// Sum of all apparatus scores.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Set one apparatus score and recompute the total.
    ///
    /// Returns `false` when the apparatus is not contested by this competitor's division.
    pub fn set_score(&mut self, apparatus: Apparatus, value: f64) -> bool {
        let Some(slot) = self.scores.get_mut(&apparatus) else {
            return false;
        };
        *slot = sanitize_score(value);
        self.recompute_total();
        true
    }

    /// Value of `metric` for this competitor.
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Total => self.total,
            Metric::Apparatus(apparatus) => self.score(apparatus),
        }
    }

    fn recompute_total(&mut self) {
        self.total = round_score(self.scores.values().sum());
    }
}

/// What a ranking is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, SerializeDisplay, DeserializeFromStr)]
pub enum Metric {
    /// All-around total.
    #[default]
    Total,
    /// A single apparatus score.
    Apparatus(Apparatus),
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Total => f.write_str("total"),
            Metric::Apparatus(apparatus) => f.write_str(apparatus.as_str()),
        }
    }
}

impl FromStr for Metric {
    type Err = UnknownName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "total" => Ok(Metric::Total),
            other => other.parse().map(Metric::Apparatus),
        }
    }
}

/// Live scoreboard of one division.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompetitionState {
    /// Title displayed above the rankings.
    pub competition_name: String,
    competitors: IndexMap<String, Competitor>,
    last_updated: Option<SystemTime>,
}

impl CompetitionState {
    /// Build a state from a competitor list, keeping the list order.
    pub fn new(competition_name: impl Into<String>, competitors: Vec<Competitor>) -> Self {
        let mut state = Self {
            competition_name: competition_name.into(),
            ..Self::default()
        };
        state.replace_competitors(competitors);
        state
    }

    /// Competitors in entry order.
    pub fn competitors(&self) -> impl ExactSizeIterator<Item = &Competitor> {
        self.competitors.values()
    }

    /// Look a competitor up by its stable id.
    pub fn competitor(&self, id: &str) -> Option<&Competitor> {
        self.competitors.get(id)
    }

    /// Mutable access to a competitor by id.
    pub fn competitor_mut(&mut self, id: &str) -> Option<&mut Competitor> {
        self.competitors.get_mut(id)
    }

    /// Replace every competitor at once.
    pub fn replace_competitors(&mut self, competitors: Vec<Competitor>) {
        self.competitors = competitors
            .into_iter()
            .map(|competitor| (competitor.id.clone(), competitor))
            .collect();
    }

    /// Distinct class names present in the division, in first-seen order.
    pub fn classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = Vec::new();
        for competitor in self.competitors.values() {
            if !classes.contains(&competitor.class) {
                classes.push(competitor.class.clone());
            }
        }
        classes
    }

    /// Time of the last applied mutation.
    pub fn last_updated(&self) -> Option<SystemTime> {
        self.last_updated
    }

    /// Record that a mutation has just been applied.
    pub(crate) fn touch(&mut self) {
        self.last_updated = Some(SystemTime::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gymnast(scores: &[(Apparatus, f64)]) -> Competitor {
        Competitor::new(
            Division::Women,
            "w-0",
            "Aiko",
            "上級",
            "1組",
            scores.iter().copied(),
        )
    }

    #[test]
    fn new_fills_every_division_apparatus() {
        let competitor = gymnast(&[(Apparatus::Floor, 9.5)]);
        assert_eq!(competitor.scores().len(), 4);
        assert_eq!(competitor.score(Apparatus::Floor), 9.5);
        assert_eq!(competitor.score(Apparatus::Beam), 0.0);
        assert_eq!(competitor.total(), 9.5);
    }

    #[test]
    fn foreign_apparatus_is_ignored() {
        let mut competitor = gymnast(&[(Apparatus::Rings, 9.0)]);
        assert_eq!(competitor.total(), 0.0);
        assert!(!competitor.set_score(Apparatus::Pommel, 8.0));
        assert_eq!(competitor.total(), 0.0);
    }

    #[test]
    fn set_score_recomputes_total() {
        let mut competitor = gymnast(&[(Apparatus::Floor, 9.5), (Apparatus::Vault, 8.25)]);
        assert_eq!(competitor.total(), 17.75);

        assert!(competitor.set_score(Apparatus::Vault, 9.0));
        assert_eq!(competitor.total(), 18.5);

        assert!(competitor.set_score(Apparatus::Floor, f64::NAN));
        assert_eq!(competitor.score(Apparatus::Floor), 0.0);
        assert_eq!(competitor.total(), 9.0);
    }

    #[test]
    fn totals_are_rounded_to_thousandths() {
        let competitor = gymnast(&[
            (Apparatus::Floor, 0.1),
            (Apparatus::Vault, 0.2),
            (Apparatus::Bars, 13.7),
        ]);
        assert_eq!(competitor.total(), 14.0);
    }

    #[test]
    fn oversized_scores_count_as_zero() {
        assert_eq!(sanitize_score(1e306), 0.0);
        assert_eq!(sanitize_score(-1e306), 0.0);
        assert_eq!(sanitize_score(MAX_SCORE_MAGNITUDE), MAX_SCORE_MAGNITUDE);
        assert_eq!(parse_score("1e306"), 0.0);
        assert_eq!(round_score(1e306), 1e306);

        let mut competitor = gymnast(&[(Apparatus::Floor, 9.5), (Apparatus::Vault, 1e306)]);
        assert_eq!(competitor.score(Apparatus::Vault), 0.0);
        assert!(competitor.set_score(Apparatus::Beam, 1e308));
        assert!(competitor.set_score(Apparatus::Bars, 1e308));
        assert!(competitor.total().is_finite());
        assert_eq!(competitor.total(), 9.5);
    }

    #[test]
    fn parse_score_defaults_to_zero() {
        assert_eq!(parse_score(" 9.5 "), 9.5);
        assert_eq!(parse_score("-1.25"), -1.25);
        assert_eq!(parse_score(""), 0.0);
        assert_eq!(parse_score("DNS"), 0.0);
        assert_eq!(parse_score("inf"), 0.0);
    }

    #[test]
    fn metric_parses_total_and_apparatus() {
        assert_eq!("total".parse::<Metric>(), Ok(Metric::Total));
        assert_eq!(
            "beam".parse::<Metric>(),
            Ok(Metric::Apparatus(Apparatus::Beam))
        );
        assert!("average".parse::<Metric>().is_err());
        assert_eq!(Metric::Apparatus(Apparatus::Hbar).to_string(), "hbar");
    }

    #[test]
    fn classes_are_listed_once_in_entry_order() {
        let state = CompetitionState::new(
            "Spring Cup",
            vec![
                Competitor::new(Division::Men, "m-0", "A", "中級", "1組", []),
                Competitor::new(Division::Men, "m-1", "B", "上級", "1組", []),
                Competitor::new(Division::Men, "m-2", "C", "中級", "2組", []),
            ],
        );
        assert_eq!(state.classes(), vec!["中級".to_string(), "上級".to_string()]);
        assert!(state.competitor("m-2").is_some());
        assert!(state.competitor("m-3").is_none());
    }
}
