// src/deps/http.rs

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use anyhow::{anyhow, Context};
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::installer::{DependencyDownloader, DownloadProgress};
use super::Dependency;
use crate::config::{DependencySources, EnginePaths};
use crate::errors::{Result, RunnerError};

const USER_AGENT: &str = concat!("ytdlp-runner/", env!("CARGO_PKG_VERSION"));

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
/// Longest silence tolerated between two reads of a response.
pub const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client with the default connect and read timeouts.
pub fn http_client() -> Result<Client> {
    build_client(CONNECT_TIMEOUT, READ_TIMEOUT)
}

/// HTTP client that gives up on a stalled server instead of waiting forever.
pub fn build_client(connect_timeout: Duration, read_timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
        .build()
        .context("building HTTP client")?;
    Ok(client)
}

/// Downloads each dependency's binary from its configured URL straight to
/// the path the snapshot provider checks.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
    sources: DependencySources,
    targets: HashMap<Dependency, PathBuf>,
}

impl HttpDownloader {
    pub fn new(sources: DependencySources, paths: &EnginePaths) -> Result<Self> {
        Ok(Self::with_client(http_client()?, sources, paths))
    }

    pub fn with_client(client: Client, sources: DependencySources, paths: &EnginePaths) -> Self {
        let targets = Dependency::ALL
            .into_iter()
            .map(|dep| (dep, paths.dependency_binary(dep).to_path_buf()))
            .collect();
        Self {
            client,
            sources,
            targets,
        }
    }

    async fn fetch(&self, dependency: Dependency, on_progress: DownloadProgress<'_>) -> Result<()> {
        let url = self.sources.url_for(dependency).ok_or_else(|| {
            RunnerError::ConfigError(format!(
                "no download source configured for {dependency} ([dependencies].{dependency})"
            ))
        })?;
        let target = self
            .targets
            .get(&dependency)
            .ok_or_else(|| anyhow!("no install path for {dependency}"))?;

        info!(dependency = %dependency, %url, target = ?target, "downloading dependency");
        download_to(&self.client, url, target, on_progress).await?;
        mark_executable(target).await?;
        Ok(())
    }
}

impl DependencyDownloader for HttpDownloader {
    fn download<'a>(
        &'a self,
        dependency: Dependency,
        on_progress: DownloadProgress<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.fetch(dependency, on_progress))
    }
}

/// Stream `url` into `<dest>.part`, then move it onto `dest`.
///
/// Progress is reported as a percentage of the advertised content length;
/// without one, only 100 is reported at the end.
pub async fn download_to(
    client: &Client,
    url: &str,
    dest: &Path,
    on_progress: DownloadProgress<'_>,
) -> Result<()> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("requesting {url}"))?;

    if !response.status().is_success() {
        return Err(anyhow!("download of {url} failed: HTTP {}", response.status()).into());
    }

    let total = response.content_length().unwrap_or(0);

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let partial = partial_path(dest);
    let downloaded = match write_body(response, url, &partial, total, on_progress).await {
        Ok(bytes) => bytes,
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&partial).await {
                debug!(path = ?partial, error = %rm, "no partial download to remove");
            }
            return Err(e);
        }
    };

    tokio::fs::rename(&partial, dest)
        .await
        .with_context(|| format!("moving {:?} into place", partial))?;
    on_progress(100);

    debug!(%url, bytes = downloaded, "download complete");
    Ok(())
}

async fn write_body(
    response: reqwest::Response,
    url: &str,
    partial: &Path,
    total: u64,
    on_progress: DownloadProgress<'_>,
) -> Result<u64> {
    let mut file = tokio::fs::File::create(partial)
        .await
        .with_context(|| format!("creating {:?}", partial))?;

    let mut downloaded: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.with_context(|| format!("reading body of {url}"))?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        if total > 0 {
            on_progress(percent_of(downloaded, total));
        }
    }
    file.flush().await?;
    Ok(downloaded)
}

fn percent_of(done: u64, total: u64) -> u8 {
    (done.saturating_mul(100) / total).min(100) as u8
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

#[cfg(unix)]
async fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o755);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn mark_executable(_path: &Path) -> Result<()> {
    Ok(())
}
