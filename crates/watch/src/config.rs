use std::time::Duration;

/// Default server address, matching the API's default bind port.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Default delay between results polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Watch client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Base URL of the DeepGuard API, without a trailing slash.
    pub base_url: String,
    /// Delay between results polls (default: 2 s).
    pub poll_interval: Duration,
}

impl WatchConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var            | Default                 |
    /// |--------------------|-------------------------|
    /// | `DEEPGUARD_URL`    | `http://localhost:5000` |
    /// | `POLL_INTERVAL_MS` | `2000`                  |
    pub fn from_env() -> Self {
        let base_url = std::env::var("DEEPGUARD_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());

        let poll_interval_ms: u64 = std::env::var("POLL_INTERVAL_MS")
            .unwrap_or_else(|_| DEFAULT_POLL_INTERVAL_MS.to_string())
            .parse()
            .expect("POLL_INTERVAL_MS must be a valid u64");
        assert!(poll_interval_ms > 0, "POLL_INTERVAL_MS must be greater than zero");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_millis(poll_interval_ms),
        }
    }
}
