// src/update/github.rs

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use anyhow::Context;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{ReleaseInfo, ReleaseSource};
use crate::deps::http::{download_to, http_client};
use crate::errors::{Result, RunnerError};
use crate::types::UpdateChannel;

const API_BASE: &str = "https://api.github.com";
const ASSET_NAME: &str = "yt-dlp";

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    name: Option<String>,
    assets: Vec<GitHubAsset>,
}

#[derive(Debug, Deserialize)]
struct GitHubAsset {
    name: String,
    browser_download_url: String,
}

/// Reads `releases/latest` of the channel's repository.
#[derive(Debug, Clone)]
pub struct GithubReleaseSource {
    client: Client,
    api_base: String,
}

impl GithubReleaseSource {
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(http_client()?, API_BASE))
    }

    /// Use `client` against `api_base` (e.g. a GitHub Enterprise or test server).
    pub fn with_client(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
        }
    }

    async fn fetch_latest(&self, channel: UpdateChannel) -> Result<ReleaseInfo> {
        let url = format!(
            "{}/repos/{}/releases/latest",
            self.api_base.trim_end_matches('/'),
            channel.repository()
        );
        debug!(%url, %channel, "fetching latest release");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;

        if !response.status().is_success() {
            return Err(RunnerError::UpdateError(format!(
                "release lookup for {channel} failed: HTTP {}",
                response.status()
            )));
        }

        let release: GitHubRelease = response
            .json()
            .await
            .with_context(|| format!("decoding release metadata from {url}"))?;

        let asset = release
            .assets
            .into_iter()
            .find(|a| a.name == ASSET_NAME)
            .ok_or_else(|| {
                RunnerError::UpdateError(format!(
                    "release {} has no '{ASSET_NAME}' asset",
                    release.tag_name
                ))
            })?;

        Ok(ReleaseInfo {
            tag: release.tag_name,
            name: release.name,
            download_url: asset.browser_download_url,
        })
    }
}

impl ReleaseSource for GithubReleaseSource {
    fn latest_release<'a>(
        &'a self,
        channel: UpdateChannel,
    ) -> Pin<Box<dyn Future<Output = Result<ReleaseInfo>> + Send + 'a>> {
        Box::pin(self.fetch_latest(channel))
    }

    fn fetch_asset<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move { download_to(&self.client, url, dest, &|_| {}).await })
    }
}
