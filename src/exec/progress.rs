// src/exec/progress.rs

//! Recognizer for the download progress lines printed on stdout.
//!
//! A progress line looks like
//! `[download]  42.3% of 10.00MiB at 1.20MiB/s ETA 00:07`.
//! Lines that do not start with `[download]` are never progress lines.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;

static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("valid percent regex"));

static ETA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ETA\s+(\d+(?::\d+)+)").expect("valid eta regex"));

const DOWNLOAD_PREFIX: &str = "[download]";

/// Progress parsed from one stdout line.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Completion in `[0, 1]`, if the line carried a percentage.
    pub fraction: Option<f32>,
    /// Estimated time remaining, if known.
    pub eta: Option<Duration>,
    /// The line the values were parsed from.
    pub line: String,
}

impl ProgressEvent {
    /// Completion as a percentage in `[0, 100]`.
    pub fn percent(&self) -> Option<f32> {
        self.fraction.map(|f| f * 100.0)
    }
}

/// Callback receiving every recognized progress line, in stream order.
pub type ProgressCallback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Parse `line` as a progress line.
///
/// Returns `None` for unrelated or garbled lines; a line counts as progress
/// when it carries a percentage, an ETA, or both.
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let rest = line.trim_start().strip_prefix(DOWNLOAD_PREFIX)?;

    let fraction = PERCENT_RE
        .captures(rest)
        .and_then(|caps| caps[1].parse::<f32>().ok())
        .filter(|pct| pct.is_finite())
        .map(|pct| (pct / 100.0).clamp(0.0, 1.0));

    let eta = ETA_RE
        .captures(rest)
        .and_then(|caps| parse_clock(&caps[1]));

    if fraction.is_none() && eta.is_none() {
        return None;
    }

    Some(ProgressEvent {
        fraction,
        eta,
        line: line.to_string(),
    })
}

/// `ss`, `mm:ss` or `hh:mm:ss` into a duration.
fn parse_clock(s: &str) -> Option<Duration> {
    let mut total: u64 = 0;
    for part in s.split(':') {
        let value: u64 = part.parse().ok()?;
        total = total.checked_mul(60)?.checked_add(value)?;
    }
    Some(Duration::from_secs(total))
}
