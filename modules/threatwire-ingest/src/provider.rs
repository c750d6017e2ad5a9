use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use threatwire_common::{RawAttack, RawVictim, Result, ThreatwireError};

/// Upstream threat-intelligence provider. Each poll is an independent,
/// best-effort snapshot read of a JSON array endpoint.
#[async_trait]
pub trait ThreatFeedProvider: Send + Sync {
    async fn recent_victims(&self) -> Result<Vec<RawVictim>>;
    async fn recent_cyberattacks(&self) -> Result<Vec<RawAttack>>;
}

/// HTTP client for the ransomware.live v2 API.
pub struct RansomwareLiveClient {
    client: reqwest::Client,
    base_url: String,
}

impl RansomwareLiveClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_array<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "Fetching provider records");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ThreatwireError::Provider(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ThreatwireError::Provider(format!(
                "{url} returned {status}"
            )));
        }

        resp.json()
            .await
            .map_err(|e| ThreatwireError::Provider(e.to_string()))
    }
}

#[async_trait]
impl ThreatFeedProvider for RansomwareLiveClient {
    async fn recent_victims(&self) -> Result<Vec<RawVictim>> {
        self.fetch_array("recentvictims").await
    }

    async fn recent_cyberattacks(&self) -> Result<Vec<RawAttack>> {
        self.fetch_array("recentcyberattacks").await
    }
}
