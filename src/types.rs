use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Remote source the managed binary is updated from.
///
/// - `Stable`: tagged releases (default).
/// - `Nightly`: nightly builds.
/// - `Master`: builds of every push to master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateChannel {
    Stable,
    Nightly,
    Master,
}

impl UpdateChannel {
    /// GitHub `owner/repo` publishing releases for this channel.
    pub fn repository(&self) -> &'static str {
        match self {
            UpdateChannel::Stable => "yt-dlp/yt-dlp",
            UpdateChannel::Nightly => "yt-dlp/yt-dlp-nightly-builds",
            UpdateChannel::Master => "yt-dlp/yt-dlp-master-builds",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateChannel::Stable => "stable",
            UpdateChannel::Nightly => "nightly",
            UpdateChannel::Master => "master",
        }
    }
}

impl Default for UpdateChannel {
    fn default() -> Self {
        UpdateChannel::Stable
    }
}

impl fmt::Display for UpdateChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for UpdateChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stable" => Ok(UpdateChannel::Stable),
            "nightly" => Ok(UpdateChannel::Nightly),
            "master" => Ok(UpdateChannel::Master),
            other => Err(format!(
                "invalid update channel: {other} (expected \"stable\", \"nightly\" or \"master\")"
            )),
        }
    }
}

/// Runtime components that must be present before the engine can run.
///
/// The declaration order is the fixed order used when installing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dependency {
    /// Python interpreter running the managed script.
    Python,
    /// Media tool used for merging and post-processing.
    Ffmpeg,
    /// External downloader helper.
    Aria2c,
}

impl Dependency {
    pub const ALL: [Dependency; 3] = [Dependency::Python, Dependency::Ffmpeg, Dependency::Aria2c];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dependency::Python => "python",
            Dependency::Ffmpeg => "ffmpeg",
            Dependency::Aria2c => "aria2c",
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Dependency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" => Ok(Dependency::Python),
            "ffmpeg" => Ok(Dependency::Ffmpeg),
            "aria2c" => Ok(Dependency::Aria2c),
            other => Err(format!(
                "unknown dependency: {other} (expected python, ffmpeg or aria2c)"
            )),
        }
    }
}
