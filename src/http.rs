use reqwest::Client;
use std::time::Duration;

fn env_secs(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Shared HTTP client for feed downloads and Admin API calls. Feed files can
/// be large, so the request timeout is generous and overridable.
pub fn build_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(env_secs("FEEDSYNC_HTTP_TIMEOUT_SECS", 30)))
        .connect_timeout(Duration::from_secs(env_secs(
            "FEEDSYNC_HTTP_CONNECT_TIMEOUT_SECS",
            5,
        )))
        .build()
        .unwrap_or_else(|_| Client::new())
}
