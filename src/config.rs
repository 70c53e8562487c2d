//! Application-level configuration loading: spreadsheet bridge endpoint, timeouts
//! and the domain defaults used by CSV import, loading and ranking.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "GYM_SCORE_BACK_CONFIG_PATH";
/// Environment variable that overrides the configured spreadsheet bridge URL.
pub const SHEET_BRIDGE_URL_ENV: &str = "GAS_WEB_APP_URL";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const DEFAULT_PERSISTENCE_LOCK_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SSE_RETRY_MS: u64 = 3_000;
const DEFAULT_GROUP_SUFFIX: &str = "組";
const DEFAULT_CLASS_ORDER: [&str; 3] = ["上級", "中級", "初級"];

/// Values substituted for blank fields when a division is loaded from the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RowDefaults {
    /// Competitor name.
    pub name: String,
    /// Competitor class.
    pub class: String,
    /// Rotation group.
    pub group: String,
}

impl Default for RowDefaults {
    fn default() -> Self {
        Self {
            name: "名無し".into(),
            class: "初級".into(),
            group: "1組".into(),
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    sheet_bridge_url: Option<String>,
    request_timeout: Duration,
    persistence_lock_timeout: Duration,
    group_suffix: String,
    class_order: Vec<String>,
    row_defaults: RowDefaults,
    sse_retry: Duration,
    auto_save_on_import: bool,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    ///
    /// The spreadsheet bridge URL from the environment always wins over the file.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded configuration file");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        match non_empty(env::var(SHEET_BRIDGE_URL_ENV).ok()) {
            Some(url) => config.with_sheet_bridge_url(Some(url)),
            None => config,
        }
    }

    /// Replace the spreadsheet bridge URL; `None` runs the server without persistence.
    pub fn with_sheet_bridge_url(mut self, url: Option<String>) -> Self {
        self.sheet_bridge_url = non_empty(url);
        self
    }

    /// Replace the time a persistence call may wait for, and hold, the persistence lock.
    pub fn with_persistence_lock_timeout(mut self, limit: Duration) -> Self {
        self.persistence_lock_timeout = limit;
        self
    }

    /// Apps Script web app URL, when one is configured.
    pub fn sheet_bridge_url(&self) -> Option<&str> {
        self.sheet_bridge_url.as_deref()
    }

    /// Timeout applied to every outbound HTTP request.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Bound on waiting for, and then holding, the persistence lock.
    pub fn persistence_lock_timeout(&self) -> Duration {
        self.persistence_lock_timeout
    }

    /// Suffix appended to purely numeric group cells.
    pub fn group_suffix(&self) -> &str {
        &self.group_suffix
    }

    /// Preferred display order of classes.
    pub fn class_order(&self) -> &[String] {
        &self.class_order
    }

    /// Fallback values for blank fields read back from the sheet.
    pub fn row_defaults(&self) -> &RowDefaults {
        &self.row_defaults
    }

    /// Reconnect delay suggested to SSE clients.
    pub fn sse_retry(&self) -> Duration {
        self.sse_retry
    }

    /// Whether a successful CSV import is pushed to the spreadsheet right away.
    pub fn auto_save_on_import(&self) -> bool {
        self.auto_save_on_import
    }

    /// Enable or disable pushing imports to the spreadsheet.
    pub fn with_auto_save_on_import(mut self, enabled: bool) -> Self {
        self.auto_save_on_import = enabled;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    sheet_bridge_url: Option<String>,
    request_timeout_secs: Option<u64>,
    persistence_lock_timeout_secs: Option<u64>,
    group_suffix: Option<String>,
    class_order: Option<Vec<String>>,
    fallbacks: Option<RowDefaults>,
    sse_retry_ms: Option<u64>,
    auto_save_on_import: Option<bool>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            sheet_bridge_url: non_empty(value.sheet_bridge_url),
            request_timeout: Duration::from_secs(
                value
                    .request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            persistence_lock_timeout: Duration::from_secs(
                value
                    .persistence_lock_timeout_secs
                    .unwrap_or(DEFAULT_PERSISTENCE_LOCK_TIMEOUT_SECS),
            ),
            group_suffix: value
                .group_suffix
                .unwrap_or_else(|| DEFAULT_GROUP_SUFFIX.to_string()),
            class_order: value.class_order.unwrap_or_else(|| {
                DEFAULT_CLASS_ORDER
                    .iter()
                    .map(|class| class.to_string())
                    .collect()
            }),
            row_defaults: value.fallbacks.unwrap_or_default(),
            sse_retry: Duration::from_millis(value.sse_retry_ms.unwrap_or(DEFAULT_SSE_RETRY_MS)),
            auto_save_on_import: value.auto_save_on_import.unwrap_or(true),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
