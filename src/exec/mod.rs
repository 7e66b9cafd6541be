// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs the managed script as a child process using `tokio::process::Command`
//! and reports the outcome back to the caller.
//!
//! - [`request`] holds the invocation options and the pure command builder.
//! - [`progress`] recognizes download progress lines on stdout.
//! - [`reader`] drains the child's stdout/stderr into text buffers.
//! - [`registry`] maps caller-chosen ids to live processes for cancellation.
//! - [`engine`] ties it together and classifies the exit status.
//! - [`info`] is the typed result of `--dump-json` runs.

pub mod engine;
pub mod info;
pub mod progress;
pub mod reader;
pub mod registry;
pub mod request;

pub use engine::{Engine, RunResult};
pub use info::VideoInfo;
pub use progress::{parse_progress_line, ProgressCallback, ProgressEvent};
pub use registry::{ProcessHandle, ProcessInfo, ProcessRegistry};
pub use request::{build_command, Request, RequestOption};
