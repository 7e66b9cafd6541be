// src/config/validate.rs

use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, RunnerError};
use crate::types::Dependency;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::RunnerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.paths, raw.update, raw.dependencies))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_paths(cfg)?;
    validate_dependency_sources(cfg)?;
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    let paths = &cfg.paths;
    let entries = [
        ("base_dir", paths.base_dir.as_deref()),
        ("native_dir", paths.native_dir.as_deref()),
        ("interpreter", paths.interpreter.as_deref()),
        ("script", paths.script.as_deref()),
        ("ffmpeg", paths.ffmpeg.as_deref()),
        ("aria2c", paths.aria2c.as_deref()),
    ];

    for (key, value) in entries {
        if value.is_some_and(|p: &Path| p.as_os_str().is_empty()) {
            return Err(RunnerError::ConfigError(format!(
                "[paths].{key} must not be empty"
            )));
        }
    }
    Ok(())
}

fn validate_dependency_sources(cfg: &RawConfigFile) -> Result<()> {
    for dep in Dependency::ALL {
        let Some(url) = cfg.dependencies.url_for(dep) else {
            continue;
        };
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(RunnerError::ConfigError(format!(
                "[dependencies].{dep} must be an http(s) URL (got '{url}')"
            )));
        }
    }
    Ok(())
}
