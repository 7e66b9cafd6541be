// src/deps/mod.rs

//! Runtime dependencies (interpreter, media tool, downloader helper).
//!
//! - [`DependencySnapshot`] is a point-in-time presence report.
//! - [`SnapshotProvider`] produces snapshots; [`FsSnapshotProvider`] looks
//!   for each dependency's binary on disk.
//! - [`installer`] downloads whatever is missing and verifies the result.
//! - [`http`] is the production download routine.

pub mod http;
pub mod installer;

use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::config::EnginePaths;
use crate::errors::Result;
use crate::fs::FileSystem;

pub use crate::types::Dependency;
pub use http::HttpDownloader;
pub use installer::{ChangedOnly, DependencyDownloader, DependencyInstaller, DownloadProgress};

/// Which dependencies are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DependencySnapshot {
    pub python: bool,
    pub ffmpeg: bool,
    pub aria2c: bool,
}

impl DependencySnapshot {
    pub fn all_present() -> Self {
        Self {
            python: true,
            ffmpeg: true,
            aria2c: true,
        }
    }

    pub fn none_present() -> Self {
        Self::default()
    }

    pub fn is_present(&self, dependency: Dependency) -> bool {
        match dependency {
            Dependency::Python => self.python,
            Dependency::Ffmpeg => self.ffmpeg,
            Dependency::Aria2c => self.aria2c,
        }
    }

    pub fn set(&mut self, dependency: Dependency, present: bool) {
        match dependency {
            Dependency::Python => self.python = present,
            Dependency::Ffmpeg => self.ffmpeg = present,
            Dependency::Aria2c => self.aria2c = present,
        }
    }

    /// Absent dependencies, in install order.
    pub fn missing(&self) -> Vec<Dependency> {
        Dependency::ALL
            .into_iter()
            .filter(|dep| !self.is_present(*dep))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

pub trait SnapshotProvider: Send + Sync {
    fn snapshot(&self) -> Result<DependencySnapshot>;
}

/// Reports a dependency as present when its binary exists as a file.
#[derive(Debug)]
pub struct FsSnapshotProvider {
    fs: Arc<dyn FileSystem>,
    binaries: Vec<(Dependency, PathBuf)>,
}

impl FsSnapshotProvider {
    pub fn new(fs: Arc<dyn FileSystem>, paths: &EnginePaths) -> Self {
        let binaries = Dependency::ALL
            .into_iter()
            .map(|dep| (dep, paths.dependency_binary(dep).to_path_buf()))
            .collect();
        Self { fs, binaries }
    }
}

impl SnapshotProvider for FsSnapshotProvider {
    fn snapshot(&self) -> Result<DependencySnapshot> {
        let mut snapshot = DependencySnapshot::none_present();
        for (dep, path) in &self.binaries {
            let present = self.fs.is_file(path);
            debug!(dependency = %dep, path = ?path, present, "checked dependency");
            snapshot.set(*dep, present);
        }
        Ok(snapshot)
    }
}
