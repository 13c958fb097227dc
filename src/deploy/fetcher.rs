//! Retrieval of URL-sourced bundle content

use crate::deploy::{DeployError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Download `url` into `destination`, returning the number of bytes written.
    async fn fetch(&self, url: &Url, destination: &Path) -> Result<u64>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Option<u64>) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("bundle-deploy/", env!("CARGO_PKG_VERSION")));

        if let Some(timeout_secs) = timeout {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }

        let client = builder.build().map_err(|e| {
            DeployError::Deployer(format!("Failed to create HTTP client: {e}"))
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, destination: &Path) -> Result<u64> {
        let download_failed = |reason: String| DeployError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| download_failed(e.to_string()))?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(destination).await?;

        let mut size = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| download_failed(e.to_string()))?
        {
            file.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(url = %url, path = %destination.display(), size, "Downloaded file");
        Ok(size)
    }
}

/// Fetches `file://` URLs by copying from the local filesystem
#[derive(Debug, Default)]
pub struct FileUrlFetcher;

#[async_trait]
impl ContentFetcher for FileUrlFetcher {
    async fn fetch(&self, url: &Url, destination: &Path) -> Result<u64> {
        let source = url.to_file_path().map_err(|_| DeployError::DownloadFailed {
            url: url.to_string(),
            reason: "not a local file URL".to_string(),
        })?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(tokio::fs::copy(&source, destination).await?)
    }
}
