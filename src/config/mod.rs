// src/config/mod.rs

//! Configuration loading, validation and path initialization.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like override paths and download URLs (`validate.rs`).
//! - Resolve the immutable engine paths and child environment (`paths.rs`).

pub mod loader;
pub mod model;
pub mod paths;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, DependencySources, PathsSection, RawConfigFile, UpdateSection};
pub use paths::EnginePaths;
