// src/deps/installer.rs

//! Dependency installer: download what a snapshot reports missing, then
//! confirm with a fresh snapshot.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU16, Ordering};

use tracing::{debug, info, warn};

use super::{Dependency, DependencySnapshot, SnapshotProvider};
use crate::errors::{Result, RunnerError};

/// Progress sink handed to a download routine; receives percent (0-100).
pub type DownloadProgress<'a> = &'a (dyn Fn(u8) + Send + Sync);

/// Download routine for individual dependencies.
///
/// Production code uses [`super::HttpDownloader`]; tests supply fakes.
pub trait DependencyDownloader: Send + Sync {
    fn download<'a>(
        &'a self,
        dependency: Dependency,
        on_progress: DownloadProgress<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Forwards a percentage only when it differs from the last one forwarded.
#[derive(Debug)]
pub struct ChangedOnly {
    last: AtomicU16,
}

impl ChangedOnly {
    const NONE: u16 = u16::MAX;

    pub fn new() -> Self {
        Self {
            last: AtomicU16::new(Self::NONE),
        }
    }

    /// Record `percent`; true if it should be forwarded.
    pub fn changed(&self, percent: u8) -> bool {
        self.last.swap(u16::from(percent), Ordering::AcqRel) != u16::from(percent)
    }
}

impl Default for ChangedOnly {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DependencyInstaller<D, S> {
    downloader: D,
    snapshots: S,
}

impl<D, S> DependencyInstaller<D, S>
where
    D: DependencyDownloader,
    S: SnapshotProvider,
{
    pub fn new(downloader: D, snapshots: S) -> Self {
        Self {
            downloader,
            snapshots,
        }
    }

    pub fn snapshot(&self) -> Result<DependencySnapshot> {
        self.snapshots.snapshot()
    }

    /// Download every dependency `current` reports missing, then verify.
    ///
    /// Downloads run one after another in [`Dependency::ALL`] order. A
    /// failed download is logged and left to the final check, which fails
    /// with [`RunnerError::MissingDependencies`] naming whatever is still
    /// absent.
    pub async fn ensure<C>(&self, current: DependencySnapshot, on_progress: C) -> Result<()>
    where
        C: Fn(Dependency, u8) + Send + Sync,
    {
        let missing = current.missing();
        if missing.is_empty() {
            debug!("all dependencies present");
            return Ok(());
        }

        info!(?missing, "installing missing dependencies");

        for dep in missing {
            let filter = ChangedOnly::new();
            let forward = |percent: u8| {
                if filter.changed(percent) {
                    on_progress(dep, percent);
                }
            };

            match self.downloader.download(dep, &forward).await {
                Ok(()) => info!(dependency = %dep, "dependency downloaded"),
                Err(e) => warn!(dependency = %dep, error = %e, "dependency download failed"),
            }
        }

        let still_missing = self.snapshots.snapshot()?.missing();
        if still_missing.is_empty() {
            info!("all dependencies installed");
            Ok(())
        } else {
            Err(RunnerError::MissingDependencies(still_missing))
        }
    }
}
