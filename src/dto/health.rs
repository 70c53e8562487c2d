use serde::Serialize;
use utoipa::ToSchema;

/// Whether spreadsheet persistence is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// A spreadsheet bridge is installed.
    Ok,
    /// No spreadsheet bridge is configured; scores live in memory only.
    Degraded,
}

/// Number of live viewers per division.
#[derive(Debug, Serialize, ToSchema)]
pub struct ViewerCounts {
    /// Viewers following the women division.
    pub women: usize,
    /// Viewers following the men division.
    pub men: usize,
}

/// Body of `/healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Whether spreadsheet persistence is available.
    pub status: HealthStatus,
    /// Connected SSE and WebSocket viewers.
    pub viewers: ViewerCounts,
}
