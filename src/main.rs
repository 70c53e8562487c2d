//! gym-score-back binary entrypoint wiring REST, WebSocket, SSE and the spreadsheet bridge.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gym_score_back::{
    config::AppConfig,
    dao::sheet_bridge::SheetBridge,
    routes,
    services::storage_supervisor::{self, StartupSchedule},
    state::{AppState, SharedState},
};

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let bridge = connect_sheet_bridge(&config)?;
    let app_state = AppState::new(config);

    tokio::spawn(storage_supervisor::run(
        app_state.clone(),
        bridge,
        StartupSchedule::default(),
    ));
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Build the Apps Script bridge when a web app URL is configured.
#[cfg(feature = "gas-bridge")]
fn connect_sheet_bridge(config: &AppConfig) -> anyhow::Result<Option<Arc<dyn SheetBridge>>> {
    use gym_score_back::dao::sheet_bridge::gas::{GasConfig, GasSheetBridge};

    let Some(url) = config.sheet_bridge_url() else {
        return Ok(None);
    };
    let bridge = GasSheetBridge::connect(GasConfig::new(url, config.request_timeout()))
        .context("building the Apps Script client")?;
    Ok(Some(Arc::new(bridge)))
}

#[cfg(not(feature = "gas-bridge"))]
fn connect_sheet_bridge(config: &AppConfig) -> anyhow::Result<Option<Arc<dyn SheetBridge>>> {
    if config.sheet_bridge_url().is_some() {
        tracing::warn!("spreadsheet bridge URL ignored: built without the `gas-bridge` feature");
    }
    Ok(None)
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
