use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use ytdlp_runner::deps::{
    Dependency, DependencyDownloader, DependencySnapshot, DownloadProgress, SnapshotProvider,
};
use ytdlp_runner::errors::{Result, RunnerError};

/// Snapshot provider backed by shared state the fake downloader updates.
#[derive(Debug, Clone, Default)]
pub struct SharedSnapshot {
    inner: Arc<Mutex<DependencySnapshot>>,
}

impl SharedSnapshot {
    pub fn new(initial: DependencySnapshot) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn get(&self) -> DependencySnapshot {
        *self.inner.lock().unwrap()
    }

    pub fn set(&self, dependency: Dependency, present: bool) {
        self.inner.lock().unwrap().set(dependency, present);
    }
}

impl SnapshotProvider for SharedSnapshot {
    fn snapshot(&self) -> Result<DependencySnapshot> {
        Ok(self.get())
    }
}

/// A fake downloader that:
/// - records which dependencies were downloaded, in order
/// - reports a scripted sequence of percentages for each download
/// - marks the dependency present in the shared snapshot, unless told to
///   fail or to "succeed" without installing anything.
pub struct FakeDownloader {
    snapshot: SharedSnapshot,
    progress: Vec<u8>,
    failing: HashSet<Dependency>,
    not_installing: HashSet<Dependency>,
    calls: Arc<Mutex<Vec<Dependency>>>,
}

impl FakeDownloader {
    pub fn new(snapshot: SharedSnapshot) -> Self {
        Self {
            snapshot,
            progress: vec![0, 50, 100],
            failing: HashSet::new(),
            not_installing: HashSet::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_progress(mut self, sequence: &[u8]) -> Self {
        self.progress = sequence.to_vec();
        self
    }

    /// Downloads of `dependency` return an error.
    pub fn failing(mut self, dependency: Dependency) -> Self {
        self.failing.insert(dependency);
        self
    }

    /// Downloads of `dependency` succeed but leave it missing.
    pub fn not_installing(mut self, dependency: Dependency) -> Self {
        self.not_installing.insert(dependency);
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<Dependency>>> {
        Arc::clone(&self.calls)
    }
}

impl DependencyDownloader for FakeDownloader {
    fn download<'a>(
        &'a self,
        dependency: Dependency,
        on_progress: DownloadProgress<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(dependency);

            for percent in &self.progress {
                on_progress(*percent);
                tokio::task::yield_now().await;
            }

            if self.failing.contains(&dependency) {
                return Err(RunnerError::Other(anyhow::anyhow!(
                    "simulated download failure for {dependency}"
                )));
            }
            if !self.not_installing.contains(&dependency) {
                self.snapshot.set(dependency, true);
            }
            Ok(())
        })
    }
}
