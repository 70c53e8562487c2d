use crate::{
    dto::{
        common::CompetitorSummary,
        format_system_time,
        public::{RankedRowSummary, RankingQuery, RankingResponse},
    },
    error::ServiceError,
    state::{
        SharedState,
        competition::Metric,
        division::Division,
        ranking::{order_classes, rank_class},
    },
};

/// Ranking table of one class of `division`.
///
/// Ranks are computed over the whole class before `search` filters the rows,
/// so a searched competitor keeps the rank shown on the full table.
pub async fn rankings(
    state: &SharedState,
    division: Division,
    query: RankingQuery,
) -> Result<RankingResponse, ServiceError> {
    if let Metric::Apparatus(apparatus) = query.metric {
        if !division.scores(apparatus) {
            return Err(ServiceError::InvalidInput(format!(
                "{apparatus} is not contested in the {division} division"
            )));
        }
    }

    let snapshot = state.store().snapshot(division).await;
    let classes = order_classes(snapshot.state.classes(), state.config().class_order());
    let class = query
        .class
        .filter(|class| !class.trim().is_empty())
        .or_else(|| classes.first().cloned());
    let search = query
        .search
        .map(|term| term.trim().to_string())
        .filter(|term| !term.is_empty());

    let rows = match &class {
        Some(class) => rank_class(snapshot.state.competitors(), class, query.metric)
            .into_iter()
            .filter(|row| {
                search
                    .as_deref()
                    .is_none_or(|term| row.competitor.name.contains(term))
            })
            .map(|row| RankedRowSummary {
                rank: row.rank,
                metric: row.metric,
                competitor: CompetitorSummary::from(row.competitor),
            })
            .collect(),
        None => Vec::new(),
    };

    Ok(RankingResponse {
        division,
        revision: snapshot.revision,
        competition_name: snapshot.state.competition_name.clone(),
        classes,
        class,
        metric: query.metric,
        rows,
        last_updated: snapshot.state.last_updated().map(format_system_time),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dto::admin::{FirstLine, ImportCsvRequest},
        services::scoreboard_service,
        state::{AppState, division::Apparatus},
    };

    async fn seeded() -> SharedState {
        let state = AppState::new(AppConfig::default());
        let csv = "h\n\
            初級,1,,Hana,1,1,1,1\n\
            上級,1,,Aiko,4,4,4,2.5\n\
            上級,1,,Mei,4,4,4,2.5\n\
            上級,2,,Rin,4,4,4,2\n";
        scoreboard_service::apply_csv_import(
            &state,
            Division::Women,
            &ImportCsvRequest {
                csv: csv.into(),
                first_line: FirstLine::Header,
            },
        )
        .await
        .unwrap();
        state
    }

    #[tokio::test]
    async fn defaults_to_first_class_in_display_order() {
        let state = seeded().await;
        let response = rankings(&state, Division::Women, RankingQuery::default())
            .await
            .unwrap();

        assert_eq!(response.classes, vec!["上級", "初級"]);
        assert_eq!(response.class.as_deref(), Some("上級"));
        let ranks: Vec<usize> = response.rows.iter().map(|row| row.rank).collect();
        assert_eq!(ranks, vec![1, 1, 3]);
        assert_eq!(response.rows[0].metric, 14.5);
        assert_eq!(response.rows[2].competitor.name, "Rin");
    }

    #[tokio::test]
    async fn search_keeps_full_class_ranks() {
        let state = seeded().await;
        let query = RankingQuery {
            class: Some("上級".into()),
            metric: Metric::Total,
            search: Some("Rin".into()),
        };
        let response = rankings(&state, Division::Women, query).await.unwrap();
        assert_eq!(response.rows.len(), 1);
        assert_eq!(response.rows[0].rank, 3);
    }

    #[tokio::test]
    async fn apparatus_metric_must_belong_to_division() {
        let state = seeded().await;
        let query = RankingQuery {
            metric: Metric::Apparatus(Apparatus::Rings),
            ..RankingQuery::default()
        };
        let result = rankings(&state, Division::Women, query).await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn empty_division_has_no_class() {
        let state = AppState::new(AppConfig::default());
        let response = rankings(&state, Division::Men, RankingQuery::default())
            .await
            .unwrap();
        assert!(response.class.is_none());
        assert!(response.rows.is_empty());
        assert!(response.classes.is_empty());
    }
}
