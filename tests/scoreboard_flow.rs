use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use futures::future::BoxFuture;
use serde_json::json;

use gym_score_back::{
    config::AppConfig,
    dao::{
        models::{LoadedCompetitor, LoadedSheet, SheetDocument, SheetRow},
        sheet_bridge::SheetBridge,
        storage::{StorageError, StorageResult},
    },
    dto::admin::{FirstLine, ImportCsvRequest, ScoreInput},
    dto::public::RankingQuery,
    error::ServiceError,
    services::{
        persistence_service, ranking_service, scoreboard_service,
        storage_supervisor::{self, StartupSchedule},
    },
    state::{
        AppState, SharedState,
        division::{Apparatus, Division},
    },
};

/// In-memory spreadsheet standing in for the Apps Script bridge.
#[derive(Default)]
struct FakeSheet {
    documents: Mutex<HashMap<Division, SheetDocument>>,
    archived: Mutex<Vec<Division>>,
    failing_loads: AtomicU32,
    delay: Duration,
}

#[derive(Clone, Default)]
struct FakeBridge(Arc<FakeSheet>);

impl FakeBridge {
    fn slow(delay: Duration) -> Self {
        Self(Arc::new(FakeSheet {
            delay,
            ..FakeSheet::default()
        }))
    }

    fn failing(loads: u32) -> Self {
        let bridge = Self::default();
        bridge.0.failing_loads.store(loads, Ordering::SeqCst);
        bridge
    }

    fn document(&self, division: Division) -> Option<SheetDocument> {
        self.0.documents.lock().unwrap().get(&division).cloned()
    }
}

impl SheetBridge for FakeBridge {
    fn save(
        &self,
        division: Division,
        document: SheetDocument,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let sheet = self.0.clone();
        Box::pin(async move {
            tokio::time::sleep(sheet.delay).await;
            sheet.documents.lock().unwrap().insert(division, document);
            Ok(())
        })
    }

    fn load(&self, division: Division) -> BoxFuture<'static, StorageResult<LoadedSheet>> {
        let sheet = self.0.clone();
        Box::pin(async move {
            tokio::time::sleep(sheet.delay).await;
            let remaining = sheet.failing_loads.load(Ordering::SeqCst);
            if remaining > 0 {
                sheet.failing_loads.store(remaining - 1, Ordering::SeqCst);
                return Err(StorageError::rejected("sheet temporarily unavailable"));
            }

            let documents = sheet.documents.lock().unwrap();
            let Some(document) = documents.get(&division) else {
                return Ok(LoadedSheet::default());
            };
            Ok(LoadedSheet {
                competition_name: document.competition_name.clone(),
                competitors: document
                    .rows
                    .iter()
                    .map(|row| LoadedCompetitor {
                        name: Some(row.name.clone()),
                        class: Some(row.class.clone()),
                        group: Some(row.group.clone()),
                        scores: division
                            .apparatus()
                            .iter()
                            .zip(&row.scores)
                            .map(|(apparatus, score)| (apparatus.as_str().to_string(), json!(score)))
                            .collect(),
                        total: None,
                    })
                    .collect(),
            })
        })
    }

    fn archive(&self, division: Division) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let sheet = self.0.clone();
        Box::pin(async move {
            sheet.archived.lock().unwrap().push(division);
            Ok(Some(format!("{division} sheet archived")))
        })
    }
}

const WOMEN_CSV: &str = "クラス,組,,名前,床,跳馬,段違い平行棒,平均台\n\
    上級,1,,Aiko,9.5,9.0,8.5,9.1\n\
    上級,1,,Mei,9.0,9.0\n\
    中級,2,,Rin,8.0,8.1,8.2,8.3\n\
    初級,3,,Yui,7,7,7,7\n";

fn quiet_config() -> AppConfig {
    AppConfig::default().with_auto_save_on_import(false)
}

fn csv(text: &str) -> ImportCsvRequest {
    ImportCsvRequest {
        csv: text.to_string(),
        first_line: FirstLine::Header,
    }
}

async fn with_bridge(config: AppConfig, bridge: &FakeBridge) -> SharedState {
    let state = AppState::new(config);
    state.install_sheet_bridge(Arc::new(bridge.clone())).await;
    state
}

#[tokio::test]
async fn malformed_row_is_reported_and_valid_rows_are_imported() {
    let state = AppState::new(quiet_config());

    let outcome = scoreboard_service::apply_csv_import(&state, Division::Women, &csv(WOMEN_CSV))
        .await
        .unwrap();

    assert_eq!(outcome.imported, 3);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].line_number, 3);
    let names: Vec<&str> = outcome
        .snapshot
        .state
        .competitors()
        .map(|competitor| competitor.name.as_str())
        .collect();
    assert_eq!(names, ["Aiko", "Rin", "Yui"]);
    assert_eq!(
        outcome.snapshot.state.competitor("w-1").unwrap().group,
        "2組"
    );
}

#[tokio::test]
async fn typed_score_updates_one_apparatus_and_the_total() {
    let state = AppState::new(quiet_config());
    scoreboard_service::apply_csv_import(&state, Division::Women, &csv(WOMEN_CSV))
        .await
        .unwrap();

    let value = ScoreInput::Text("9.5".into()).value();
    scoreboard_service::update_score(&state, Division::Women, "w-0", Apparatus::Floor, value)
        .await
        .unwrap();
    scoreboard_service::update_score(&state, Division::Women, "w-0", Apparatus::Beam, 8.75)
        .await
        .unwrap();

    let snapshot = scoreboard_service::get_state(&state, Division::Women).await;
    let aiko = snapshot.state.competitor("w-0").unwrap();
    assert_eq!(aiko.score(Apparatus::Floor), 9.5);
    let expected: f64 = Division::Women
        .apparatus()
        .iter()
        .map(|apparatus| aiko.score(*apparatus))
        .sum();
    assert_eq!(aiko.total(), expected);
    assert_eq!(aiko.total(), 35.75);
}

#[tokio::test]
async fn equal_totals_share_a_rank() {
    let state = AppState::new(quiet_config());
    let text = "h\n\
        上級,1,,A,4,4,4,2.5\n\
        上級,1,,B,4,4,4,2\n\
        上級,1,,C,4,4,4,2.5\n";
    scoreboard_service::apply_csv_import(&state, Division::Women, &csv(text))
        .await
        .unwrap();

    let response = ranking_service::rankings(&state, Division::Women, RankingQuery::default())
        .await
        .unwrap();

    let table: Vec<(usize, &str, f64)> = response
        .rows
        .iter()
        .map(|row| (row.rank, row.competitor.name.as_str(), row.metric))
        .collect();
    assert_eq!(table, [(1, "A", 14.5), (1, "C", 14.5), (3, "B", 14.0)]);
}

#[tokio::test]
async fn late_subscriber_starts_from_current_state() {
    let state = AppState::new(quiet_config());
    scoreboard_service::apply_csv_import(&state, Division::Women, &csv(WOMEN_CSV))
        .await
        .unwrap();
    scoreboard_service::set_competition_name(&state, Division::Women, "Spring Cup")
        .await
        .unwrap();

    let (snapshot, mut receiver) = state.store().subscribe(Division::Women).await;
    assert_eq!(snapshot.state.competition_name, "Spring Cup");
    assert_eq!(snapshot.state.competitors().len(), 3);
    assert_eq!(snapshot.revision, 2);
    assert!(receiver.try_recv().is_err());

    scoreboard_service::update_score(&state, Division::Women, "w-2", Apparatus::Vault, 7.5)
        .await
        .unwrap();
    let next = receiver.recv().await.unwrap();
    assert_eq!(next.revision, 3);
    assert_eq!(next.state.competitors().len(), 3);
}

#[tokio::test]
async fn saved_rows_match_imported_rows_and_reload_restores_them() {
    let bridge = FakeBridge::default();
    let state = with_bridge(quiet_config(), &bridge).await;
    scoreboard_service::apply_csv_import(&state, Division::Women, &csv(WOMEN_CSV))
        .await
        .unwrap();

    persistence_service::save(&state, Division::Women).await.unwrap();

    let saved = bridge.document(Division::Women).unwrap();
    let expected: Vec<SheetRow> = WOMEN_CSV
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cells: Vec<&str> = line.split(',').collect();
            SheetRow::from_text_cells(Division::Women, &cells, "組").ok()
        })
        .collect();
    assert_eq!(saved.rows, expected);

    let fresh = with_bridge(quiet_config(), &bridge).await;
    let restored = persistence_service::reload(&fresh, Division::Women)
        .await
        .unwrap();
    let imported = state.store().snapshot(Division::Women).await;
    let pairs = restored.state.competitors().zip(imported.state.competitors());
    for (restored, imported) in pairs {
        assert_eq!(restored.id, imported.id);
        assert_eq!(restored.scores(), imported.scores());
        assert_eq!(restored.total(), imported.total());
    }
    assert_eq!(restored.state.competitors().len(), 3);
}

#[tokio::test]
async fn save_without_bridge_is_degraded() {
    let state = AppState::new(quiet_config());
    let result = persistence_service::save(&state, Division::Men).await;
    assert!(matches!(result, Err(ServiceError::Degraded)));
}

#[tokio::test]
async fn persistence_calls_give_up_after_the_lock_timeout() {
    let bridge = FakeBridge::slow(Duration::from_millis(500));
    let config = quiet_config().with_persistence_lock_timeout(Duration::from_millis(100));
    let state = with_bridge(config, &bridge).await;

    let result = persistence_service::save(&state, Division::Women).await;
    assert!(matches!(result, Err(ServiceError::Timeout)));
}

#[tokio::test]
async fn concurrent_saves_are_serialized() {
    let bridge = FakeBridge::slow(Duration::from_millis(30));
    let state = with_bridge(quiet_config(), &bridge).await;

    let (first, second) = tokio::join!(
        persistence_service::save(&state, Division::Women),
        persistence_service::save(&state, Division::Men),
    );
    assert!(first.is_ok());
    assert!(second.is_ok());
    assert!(bridge.document(Division::Men).is_some());
}

#[tokio::test]
async fn startup_load_retries_before_giving_up() {
    let schedule = StartupSchedule {
        initial_delay: Duration::ZERO,
        division_pause: Duration::ZERO,
        attempts: 3,
        retry_delay: Duration::from_millis(5),
    };

    let seed = FakeBridge::failing(2);
    seed.0.documents.lock().unwrap().insert(
        Division::Women,
        SheetDocument {
            competition_name: "Autumn Open".into(),
            rows: vec![SheetRow {
                class: "上級".into(),
                group: "1組".into(),
                name: "Aiko".into(),
                scores: vec![9.0, 9.0, 9.0, 9.0],
            }],
        },
    );
    let state = AppState::new(quiet_config());
    storage_supervisor::run(state.clone(), Some(Arc::new(seed.clone())), schedule).await;

    let women = state.store().snapshot(Division::Women).await;
    assert_eq!(women.state.competition_name, "Autumn Open");
    assert_eq!(women.state.competitor("w-0").unwrap().total(), 36.0);
    assert!(!state.is_degraded().await);

    let broken = FakeBridge::failing(10);
    let state = AppState::new(quiet_config());
    storage_supervisor::run(state.clone(), Some(Arc::new(broken)), schedule).await;
    assert_eq!(state.store().snapshot(Division::Women).await.revision, 0);
    assert_eq!(state.store().snapshot(Division::Men).await.revision, 0);
}

#[tokio::test]
async fn finalize_returns_the_bridge_message() {
    let bridge = FakeBridge::default();
    let state = with_bridge(quiet_config(), &bridge).await;

    let message = persistence_service::finalize(&state, Division::Men)
        .await
        .unwrap();
    assert_eq!(message, "men sheet archived");
    assert_eq!(*bridge.0.archived.lock().unwrap(), vec![Division::Men]);
}

#[tokio::test]
async fn import_is_pushed_to_the_sheet_when_auto_save_is_on() {
    let bridge = FakeBridge::default();
    let state = with_bridge(AppConfig::default(), &bridge).await;

    scoreboard_service::apply_csv_import(&state, Division::Women, &csv(WOMEN_CSV))
        .await
        .unwrap();

    for _ in 0..50 {
        if bridge.document(Division::Women).is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(bridge.document(Division::Women).unwrap().rows.len(), 3);
}
