//! HTTP access to the DeepGuard API.
//!
//! The session only sees the [`ScanApi`] trait, so tests drive it with an
//! in-memory double. [`HttpScanApi`] is the `reqwest` implementation.

use async_trait::async_trait;
use serde::Deserialize;

use deepguard_core::results::{ScanResultRecord, ScanSummary};

use crate::error::WatchError;

/// One poll of `GET /api/v1/scan-results`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultsSnapshot {
    #[serde(default)]
    pub all_results: Vec<ScanResultRecord>,
    #[serde(default)]
    pub summary: ScanSummary,
}

#[derive(Debug, Deserialize)]
struct WebsitesBody {
    #[serde(default)]
    websites: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// The three calls the scan overlay makes.
#[async_trait]
pub trait ScanApi: Send + Sync + 'static {
    /// `GET /api/v1/websites`
    async fn fetch_websites(&self) -> Result<Vec<String>, WatchError>;

    /// `POST /api/v1/global-scan`
    async fn start_scan(&self) -> Result<(), WatchError>;

    /// `GET /api/v1/scan-results`
    async fn fetch_results(&self) -> Result<ResultsSnapshot, WatchError>;
}

/// [`ScanApi`] over HTTP.
pub struct HttpScanApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpScanApi {
    /// * `base_url` - e.g. `http://localhost:5000`, without a trailing slash.
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Return the response unchanged on a 2xx status, otherwise a
    /// [`WatchError::Api`] carrying the server's message.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, WatchError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|parsed| parsed.error)
            .unwrap_or(body);

        Err(WatchError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ScanApi for HttpScanApi {
    async fn fetch_websites(&self) -> Result<Vec<String>, WatchError> {
        let response = self.client.get(self.url("/websites")).send().await?;
        let body: WebsitesBody = Self::ensure_success(response).await?.json().await?;
        Ok(body.websites)
    }

    async fn start_scan(&self) -> Result<(), WatchError> {
        let response = self.client.post(self.url("/global-scan")).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn fetch_results(&self) -> Result<ResultsSnapshot, WatchError> {
        let response = self.client.get(self.url("/scan-results")).send().await?;
        Ok(Self::ensure_success(response).await?.json().await?)
    }
}
