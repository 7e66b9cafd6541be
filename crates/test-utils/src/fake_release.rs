use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use ytdlp_runner::errors::{Result, RunnerError};
use ytdlp_runner::fs::mock::MockFileSystem;
use ytdlp_runner::types::UpdateChannel;
use ytdlp_runner::update::{ReleaseInfo, ReleaseSource};

/// Release source serving fixed releases and writing asset "downloads"
/// into a [`MockFileSystem`].
#[derive(Clone)]
pub struct FakeReleaseSource {
    fs: MockFileSystem,
    releases: Arc<Mutex<HashMap<UpdateChannel, ReleaseInfo>>>,
    fetched: Arc<Mutex<Vec<(String, PathBuf)>>>,
}

impl FakeReleaseSource {
    pub fn new(fs: MockFileSystem) -> Self {
        Self {
            fs,
            releases: Arc::new(Mutex::new(HashMap::new())),
            fetched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Publish `tag` on `channel`; its asset content is `asset:<tag>`.
    pub fn publish(&self, channel: UpdateChannel, tag: &str, name: Option<&str>) {
        self.releases.lock().unwrap().insert(
            channel,
            ReleaseInfo {
                tag: tag.to_string(),
                name: name.map(str::to_string),
                download_url: format!("https://example.invalid/{}/{tag}/yt-dlp", channel),
            },
        );
    }

    pub fn fetched(&self) -> Vec<(String, PathBuf)> {
        self.fetched.lock().unwrap().clone()
    }
}

impl ReleaseSource for FakeReleaseSource {
    fn latest_release<'a>(
        &'a self,
        channel: UpdateChannel,
    ) -> Pin<Box<dyn Future<Output = Result<ReleaseInfo>> + Send + 'a>> {
        Box::pin(async move {
            self.releases
                .lock()
                .unwrap()
                .get(&channel)
                .cloned()
                .ok_or_else(|| RunnerError::UpdateError(format!("no release on {channel}")))
        })
    }

    fn fetch_asset<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let tag = url.rsplit('/').nth(1).unwrap_or_default();
            self.fs.add_file(dest, format!("asset:{tag}"));
            self.fetched
                .lock()
                .unwrap()
                .push((url.to_string(), dest.to_path_buf()));
            Ok(())
        })
    }
}
