//! Competition ranking ("1224" standard): equal metrics share a rank and the next
//! distinct metric resumes at its 1-based position.

use std::cmp::Ordering;

use crate::state::competition::{Competitor, Metric};

/// One line of a ranking table.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRow<'a, T> {
    /// 1-based competition rank.
    pub rank: usize,
    /// Ranked entry.
    pub competitor: &'a T,
    /// Value the rank was computed from.
    pub metric: f64,
}

/// Rank `entries` by descending `metric`.
///
/// The sort is stable, so entries with equal metrics keep their input order.
/// A non-finite metric counts as `0`. Callers filter to the class being ranked.
pub fn rank<'a, T, I, F>(entries: I, metric: F) -> Vec<RankedRow<'a, T>>
where
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> f64,
{
    let mut measured: Vec<(&'a T, f64)> = entries
        .into_iter()
        .map(|entry| {
            let value = metric(entry);
            (entry, if value.is_finite() { value } else { 0.0 })
        })
        .collect();
    measured.sort_by(|(_, a), (_, b)| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    let mut rows: Vec<RankedRow<'a, T>> = Vec::with_capacity(measured.len());
    for (position, (competitor, value)) in measured.into_iter().enumerate() {
        let rank = match rows.last() {
            Some(previous) if value >= previous.metric => previous.rank,
            _ => position + 1,
        };
        rows.push(RankedRow {
            rank,
            competitor,
            metric: value,
        });
    }
    rows
}

/// Rank the competitors of one class by `metric`.
pub fn rank_class<'a, I>(competitors: I, class: &str, metric: Metric) -> Vec<RankedRow<'a, Competitor>>
where
    I: IntoIterator<Item = &'a Competitor>,
{
    rank(
        competitors
            .into_iter()
            .filter(|competitor| competitor.class == class),
        |competitor| competitor.metric(metric),
    )
}

/// Order class names by `preferred` first, then lexicographically.
pub fn order_classes(mut classes: Vec<String>, preferred: &[String]) -> Vec<String> {
    classes.sort_by(|a, b| {
        let position = |name: &String| preferred.iter().position(|candidate| candidate == name);
        match (position(a), position(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    });
    classes
}
