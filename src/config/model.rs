// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{Dependency, UpdateChannel};

/// Configuration exactly as read from a TOML file.
///
/// ```toml
/// [paths]
/// base_dir = "/data/ytdlp"
/// native_dir = "/data/ytdlp/bin"
///
/// [update]
/// channel = "nightly"
///
/// [dependencies]
/// ffmpeg = "https://example.org/ffmpeg"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub update: UpdateSection,

    #[serde(default)]
    pub dependencies: DependencySources,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub paths: PathsSection,
    pub update: UpdateSection,
    pub dependencies: DependencySources,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        paths: PathsSection,
        update: UpdateSection,
        dependencies: DependencySources,
    ) -> Self {
        Self {
            paths,
            update,
            dependencies,
        }
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsSection {
    /// Application root. Defaults to `<data-local-dir>/ytdlp-runner`.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// Directory holding the bundled native binaries. Defaults to `<base_dir>/bin`.
    #[serde(default)]
    pub native_dir: Option<PathBuf>,

    #[serde(default)]
    pub interpreter: Option<PathBuf>,

    #[serde(default)]
    pub script: Option<PathBuf>,

    #[serde(default)]
    pub ffmpeg: Option<PathBuf>,

    #[serde(default)]
    pub aria2c: Option<PathBuf>,
}

/// `[update]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSection {
    #[serde(default)]
    pub channel: UpdateChannel,
}

/// `[dependencies]` section: where each runtime dependency is downloaded from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DependencySources {
    #[serde(default)]
    pub python: Option<String>,

    #[serde(default)]
    pub ffmpeg: Option<String>,

    #[serde(default)]
    pub aria2c: Option<String>,
}

impl DependencySources {
    pub fn url_for(&self, dependency: Dependency) -> Option<&str> {
        match dependency {
            Dependency::Python => self.python.as_deref(),
            Dependency::Ffmpeg => self.ffmpeg.as_deref(),
            Dependency::Aria2c => self.aria2c.as_deref(),
        }
    }
}
