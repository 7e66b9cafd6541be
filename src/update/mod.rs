// src/update/mod.rs

//! Updating the managed script from a release channel.
//!
//! The installed version is bookmarked in a small JSON file next to the
//! script, so `current_version` never has to run anything.

pub mod github;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::EnginePaths;
use crate::errors::{Result, RunnerError};
use crate::fs::FileSystem;
use crate::types::UpdateChannel;

pub use github::GithubReleaseSource;

const BOOKMARK_FILE: &str = "version.json";

/// Latest release published on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub tag: String,
    pub name: Option<String>,
    pub download_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    Updated,
    AlreadyUpToDate,
}

/// Where releases come from. Production code uses [`GithubReleaseSource`].
pub trait ReleaseSource: Send + Sync {
    fn latest_release<'a>(
        &'a self,
        channel: UpdateChannel,
    ) -> Pin<Box<dyn Future<Output = Result<ReleaseInfo>> + Send + 'a>>;

    /// Download `url` to `dest`, replacing any existing file.
    fn fetch_asset<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct VersionBookmark {
    version: String,
    version_name: Option<String>,
    channel: UpdateChannel,
}

pub struct UpdateOrchestrator<S> {
    source: S,
    fs: Arc<dyn FileSystem>,
    script: PathBuf,
    bookmark: PathBuf,
}

impl<S: ReleaseSource> UpdateOrchestrator<S> {
    pub fn new(source: S, fs: Arc<dyn FileSystem>, paths: &EnginePaths) -> Self {
        Self::for_script(source, fs, paths.script())
    }

    /// Manage the script at `script`; the bookmark lives in the same directory.
    pub fn for_script(source: S, fs: Arc<dyn FileSystem>, script: &Path) -> Self {
        let bookmark = script
            .parent()
            .map(|dir| dir.join(BOOKMARK_FILE))
            .unwrap_or_else(|| PathBuf::from(BOOKMARK_FILE));
        Self {
            source,
            fs,
            script: script.to_path_buf(),
            bookmark,
        }
    }

    /// Install the latest release of `channel` unless it is already installed.
    pub async fn update(&self, channel: UpdateChannel) -> Result<UpdateStatus> {
        let release = self.source.latest_release(channel).await?;
        let current = self.read_bookmark()?;

        if current.as_ref().is_some_and(|b| b.version == release.tag) {
            info!(%channel, version = %release.tag, "already up to date");
            return Ok(UpdateStatus::AlreadyUpToDate);
        }

        info!(
            %channel,
            from = ?current.as_ref().map(|b| b.version.as_str()),
            to = %release.tag,
            "updating managed script"
        );

        let staged = staged_path(&self.script);
        self.source
            .fetch_asset(&release.download_url, &staged)
            .await?;
        self.fs.rename(&staged, &self.script)?;

        let bookmark = VersionBookmark {
            version: release.tag,
            version_name: release.name,
            channel,
        };
        let json = serde_json::to_vec_pretty(&bookmark).map_err(|e| {
            RunnerError::UpdateError(format!("cannot encode version bookmark: {e}"))
        })?;
        self.fs.write(&self.bookmark, &json)?;

        Ok(UpdateStatus::Updated)
    }

    pub fn current_version(&self) -> Result<Option<String>> {
        Ok(self.read_bookmark()?.map(|b| b.version))
    }

    pub fn current_version_name(&self) -> Result<Option<String>> {
        Ok(self.read_bookmark()?.and_then(|b| b.version_name))
    }

    fn read_bookmark(&self) -> Result<Option<VersionBookmark>> {
        if !self.fs.is_file(&self.bookmark) {
            debug!(path = ?self.bookmark, "no version bookmark");
            return Ok(None);
        }
        let contents = self.fs.read_to_string(&self.bookmark)?;
        let bookmark = serde_json::from_str(&contents).map_err(|e| {
            RunnerError::UpdateError(format!(
                "corrupt version bookmark {:?}: {e}",
                self.bookmark
            ))
        })?;
        Ok(Some(bookmark))
    }
}

fn staged_path(script: &Path) -> PathBuf {
    let mut name = script.as_os_str().to_owned();
    name.push(".download");
    PathBuf::from(name)
}
