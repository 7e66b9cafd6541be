// src/lib.rs

pub mod cli;
pub mod config;
pub mod deps;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod update;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{load_or_default, ConfigFile, EnginePaths};
use crate::deps::{DependencyInstaller, FsSnapshotProvider, HttpDownloader, SnapshotProvider};
use crate::exec::{Engine, ProgressCallback, ProgressEvent, Request};
use crate::fs::{FileSystem, RealFileSystem};
use crate::update::{GithubReleaseSource, UpdateOrchestrator, UpdateStatus};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and path resolution
/// - the execution engine (with Ctrl-C as interrupt)
/// - the dependency installer
/// - the update orchestrator
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_or_default(&config_path)?;
    let paths = EnginePaths::from_config(&cfg)?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    match args.command {
        Command::Check => {
            print_check(&cfg, &paths, fs)?;
            Ok(())
        }
        Command::Install => install(&cfg, &paths, fs).await,
        Command::Update { channel } => {
            paths.prepare_dirs(fs.as_ref())?;
            let channel = channel.unwrap_or(cfg.update.channel);
            let updater = UpdateOrchestrator::new(GithubReleaseSource::new()?, fs, &paths);
            match updater.update(channel).await? {
                UpdateStatus::Updated => {
                    let version = updater.current_version()?.unwrap_or_default();
                    println!("updated yt-dlp to {version} ({channel})");
                }
                UpdateStatus::AlreadyUpToDate => println!("yt-dlp is already up to date"),
            }
            Ok(())
        }
        Command::Version => {
            let updater = UpdateOrchestrator::new(GithubReleaseSource::new()?, fs, &paths);
            match updater.current_version()? {
                Some(version) => {
                    let name = updater.current_version_name()?.unwrap_or_default();
                    println!("{version} {name}");
                }
                None => println!("no yt-dlp version installed"),
            }
            Ok(())
        }
        Command::Info { url } => {
            let engine = Engine::new(paths);
            let info = engine.get_info(&url).await?;
            println!("id:       {}", info.id.as_deref().unwrap_or("-"));
            println!("title:    {}", info.title.as_deref().unwrap_or("-"));
            println!("uploader: {}", info.uploader.as_deref().unwrap_or("-"));
            if let Some(duration) = info.duration {
                println!("duration: {duration:.0}s");
            }
            println!("formats:  {}", info.formats.len());
            Ok(())
        }
        Command::Run { id, opts, urls } => {
            let mut request = Request::with_urls(urls);
            for raw in &opts {
                match cli::split_option(raw) {
                    (flag, Some(value)) => request.add_option_value(flag, value),
                    (flag, None) => request.add_option(flag),
                };
            }

            let engine = Engine::new(paths);
            let on_progress: ProgressCallback = Arc::new(print_progress);
            let ctrl_c = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    eprintln!("failed to listen for Ctrl+C: {e}");
                    std::future::pending::<()>().await;
                }
            };

            let result = engine
                .execute_until(&request, id.as_deref(), Some(on_progress), ctrl_c)
                .await?;
            eprintln!();
            print!("{}", result.out());
            info!(
                exit_code = result.exit_code(),
                elapsed_ms = result.elapsed().as_millis() as u64,
                "run finished"
            );
            Ok(())
        }
    }
}

async fn install(cfg: &ConfigFile, paths: &EnginePaths, fs: Arc<dyn FileSystem>) -> Result<()> {
    paths.prepare_dirs(fs.as_ref())?;
    let provider = FsSnapshotProvider::new(fs, paths);
    let current = provider.snapshot()?;
    let downloader = HttpDownloader::new(cfg.dependencies.clone(), paths)?;
    let installer = DependencyInstaller::new(downloader, provider);

    installer
        .ensure(current, |dep, percent| {
            eprint!("\r{dep:<8} {percent:>3}%");
            if percent == 100 {
                eprintln!();
            }
        })
        .await?;

    println!("all dependencies installed");
    Ok(())
}

fn print_progress(event: &ProgressEvent) {
    let percent = event
        .percent()
        .map(|p| format!("{p:>5.1}%"))
        .unwrap_or_else(|| "    ?%".to_string());
    let eta = event
        .eta
        .map(|d| format!("{:02}:{:02}", d.as_secs() / 60, d.as_secs() % 60))
        .unwrap_or_else(|| "--:--".to_string());
    eprint!("\r{percent} ETA {eta}");
    let _ = std::io::stderr().flush();
}

/// Dry-run output: resolved paths and which dependencies are present.
fn print_check(cfg: &ConfigFile, paths: &EnginePaths, fs: Arc<dyn FileSystem>) -> Result<()> {
    println!("ytdlp-runner check");
    println!("  base_dir    = {}", paths.base_dir().display());
    println!("  native_dir  = {}", paths.native_dir().display());
    println!("  interpreter = {}", paths.interpreter().display());
    println!("  script      = {}", paths.script().display());
    println!("  ffmpeg      = {}", paths.ffmpeg().display());
    println!("  aria2c      = {}", paths.aria2c().display());
    println!("  channel     = {}", cfg.update.channel);
    println!();

    let snapshot = FsSnapshotProvider::new(fs, paths).snapshot()?;
    println!("dependencies:");
    for dep in deps::Dependency::ALL {
        let state = if snapshot.is_present(dep) { "present" } else { "missing" };
        let source = cfg.dependencies.url_for(dep).unwrap_or("(no source)");
        println!("  - {dep:<7} {state:<8} {source}");
    }

    println!();
    println!("environment:");
    for (key, value) in paths.environment() {
        println!("  {key}={}", value.to_string_lossy());
    }

    debug!("check complete (nothing executed)");
    Ok(())
}
