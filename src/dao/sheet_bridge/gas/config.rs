use std::time::Duration;

/// Runtime configuration describing how to reach the Apps Script web app.
#[derive(Debug, Clone)]
pub struct GasConfig {
    /// Deployed Apps Script web app endpoint.
    pub web_app_url: String,
    /// Timeout applied to every HTTP call.
    pub request_timeout: Duration,
}

impl GasConfig {
    /// Construct a configuration from an explicit web app URL.
    pub fn new(web_app_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            web_app_url: web_app_url.into(),
            request_timeout,
        }
    }
}
