// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::types::Dependency;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Engine used before its paths were set up, or setup failed.
    #[error("Initialization error: {0}")]
    InitError(String),

    #[error("Process id already in use: {0}")]
    DuplicateProcessId(String),

    #[error("Failed to start process: {0}")]
    SpawnError(#[source] std::io::Error),

    /// Non-zero exit that was neither tolerated nor caused by cancellation.
    #[error("Process exited with code {code}: {stderr}")]
    ProcessFailed { code: i32, stderr: String },

    #[error("Process cancelled: {0}")]
    Cancelled(String),

    /// The caller stopped waiting; the child was killed.
    #[error("Interrupted while waiting for process")]
    Interrupted,

    #[error("Missing dependencies after install: {}", join_dependencies(.0))]
    MissingDependencies(Vec<Dependency>),

    #[error("Failed to parse structured output: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Update error: {0}")]
    UpdateError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RunnerError {
    /// True when the invocation was cancelled through the process registry.
    ///
    /// Callers typically hide these from users instead of reporting a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunnerError::Cancelled(_))
    }
}

fn join_dependencies(deps: &[Dependency]) -> String {
    deps.iter()
        .map(Dependency::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunnerError>;
