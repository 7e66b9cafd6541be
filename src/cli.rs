// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::UpdateChannel;

/// Command-line arguments for `ytdlp-runner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ytdlp-runner",
    version,
    about = "Run yt-dlp with a managed interpreter, media tool and downloader helper.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// A missing file at the default location means "use defaults".
    #[arg(long, value_name = "PATH", default_value = "ytdlp-runner.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `YTDLP_RUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run yt-dlp with the given options and URLs.
    Run {
        /// Process id; lets the run be identified in logs and cancelled.
        #[arg(long, value_name = "ID")]
        id: Option<String>,

        /// Option to pass through, as `FLAG` or `FLAG=VALUE` (repeatable).
        #[arg(
            short = 'o',
            long = "opt",
            value_name = "FLAG[=VALUE]",
            allow_hyphen_values = true
        )]
        opts: Vec<String>,

        /// URLs to process.
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Print metadata for a URL (runs with --dump-json).
    Info { url: String },

    /// Download any missing runtime dependencies.
    Install,

    /// Update yt-dlp from a release channel.
    Update {
        /// Release channel; defaults to `[update].channel` from the config.
        #[arg(long, value_name = "CHANNEL")]
        channel: Option<UpdateChannel>,
    },

    /// Print the installed yt-dlp version.
    Version,

    /// Print resolved paths and dependency status; runs nothing.
    Check,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

/// Split a `FLAG` / `FLAG=VALUE` pass-through option.
pub fn split_option(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once('=') {
        Some((flag, value)) => (flag, Some(value)),
        None => (raw, None),
    }
}
