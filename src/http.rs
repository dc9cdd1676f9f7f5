use crate::config::HttpConfig;
use reqwest::Client;
use std::time::Duration;

/// Shared outbound client; built once at startup and cloned into components.
pub fn build_client(config: &HttpConfig) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build()
        .unwrap_or_else(|_| Client::new())
}
