//! HTTP client for the FileOrcha file-sharing API.
//!
//! Provides a minimal client over `reqwest`, the [`Transfer`] trait the terminal
//! controller is written against, and helpers for parsing upload responses,
//! download headers and share links.

pub mod api;
pub mod progress;
pub mod response;
pub mod share_link;

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use fileorcha_core::{
    ClientConfig, DownloadQuery, DownloadedFile, PreviewMetadata, TransferError, UploadRequest,
    UploadResult,
};
use reqwest::Client;
use serde::de::DeserializeOwned;

pub use progress::{ProgressCallback, ProgressReporter};
pub use share_link::{ShareLink, ShareLinkError};

/// The three network operations the client performs.
///
/// No implementation retries: a failed attempt is returned to the caller as-is.
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Upload a file, reporting the sent fraction through `progress`.
    async fn upload(
        &self,
        request: &UploadRequest,
        progress: Option<ProgressCallback>,
    ) -> Result<UploadResult, TransferError>;

    /// Fetch a file for saving to disk.
    async fn download(&self, query: &DownloadQuery) -> Result<DownloadedFile, TransferError>;

    /// Fetch a file for previewing, with metadata from the response headers.
    async fn fetch_preview(
        &self,
        query: &DownloadQuery,
    ) -> Result<(Bytes, PreviewMetadata), TransferError>;
}

/// HTTP client for the FileOrcha API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(
            &config.api_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON document. Non-success statuses use the retrieval mapping
    /// (404 / 403 / 410).
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, TransferError> {
        let url = self.build_url(path);
        let mut request = self.client.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::from_retrieval_status(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| TransferError::InvalidResponse(format!("Failed to parse JSON: {}", e)))
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

pub(crate) fn network_error(err: reqwest::Error) -> TransferError {
    tracing::debug!(error = %err, "transport failure");
    TransferError::Network(err.to_string())
}

#[async_trait]
impl Transfer for ApiClient {
    async fn upload(
        &self,
        request: &UploadRequest,
        progress: Option<ProgressCallback>,
    ) -> Result<UploadResult, TransferError> {
        self.upload_file(request, progress).await
    }

    async fn download(&self, query: &DownloadQuery) -> Result<DownloadedFile, TransferError> {
        self.download_file(query).await
    }

    async fn fetch_preview(
        &self,
        query: &DownloadQuery,
    ) -> Result<(Bytes, PreviewMetadata), TransferError> {
        self.preview_file(query).await
    }
}
