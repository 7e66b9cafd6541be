// src/exec/info.rs

//! Typed view of the JSON document printed in `--dump-json` mode.
//!
//! Only commonly used fields are typed; everything else is kept in `extra`.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::errors::Result;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VideoInfo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub fulltitle: Option<String>,
    pub uploader: Option<String>,
    pub uploader_id: Option<String>,
    pub upload_date: Option<String>,
    /// Seconds; yt-dlp prints integers or floats depending on the extractor.
    pub duration: Option<f64>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub ext: Option<String>,
    pub url: Option<String>,
    pub webpage_url: Option<String>,
    pub extractor: Option<String>,
    pub formats: Vec<VideoFormat>,
    pub thumbnails: Vec<VideoThumbnail>,
    pub http_headers: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VideoFormat {
    pub format_id: Option<String>,
    pub format_note: Option<String>,
    pub ext: Option<String>,
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub tbr: Option<f64>,
    pub abr: Option<f64>,
    pub filesize: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VideoThumbnail {
    pub id: Option<String>,
    pub url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl VideoInfo {
    /// Parse the stdout of a `--dump-json` run.
    pub fn from_json(out: &str) -> Result<Self> {
        Ok(serde_json::from_str(out.trim())?)
    }
}
