// src/config/paths.rs

//! Resolved locations of the interpreter, script and native tools, plus the
//! environment every child process is started with.
//!
//! An [`EnginePaths`] is computed once and never mutated afterwards; getting
//! a different layout means resolving a fresh value.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::errors::{Result, RunnerError};
use crate::fs::FileSystem;
use crate::types::Dependency;

const PACKAGES_DIR: &str = "packages";
const YTDLP_DIR: &str = "yt-dlp";
const YTDLP_BIN: &str = "yt-dlp";

const PYTHON_BIN: &str = "libpython.so";
const FFMPEG_BIN: &str = "libffmpeg.so";
const ARIA2C_BIN: &str = "libaria2c.so";

#[derive(Debug, Clone)]
pub struct EnginePaths {
    base_dir: PathBuf,
    native_dir: PathBuf,
    packages_dir: PathBuf,
    python_dir: PathBuf,
    ffmpeg_dir: PathBuf,
    aria2c_dir: PathBuf,
    ytdlp_dir: PathBuf,
    interpreter: PathBuf,
    script: PathBuf,
    ffmpeg: PathBuf,
    aria2c: PathBuf,
    env: Vec<(String, OsString)>,
}

impl EnginePaths {
    /// Compute every path and the child environment from the application
    /// root and the directory holding the bundled native binaries.
    pub fn resolve(base_dir: impl Into<PathBuf>, native_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        let native_dir = native_dir.into();

        let packages_dir = base_dir.join(PACKAGES_DIR);
        let python_dir = packages_dir.join(Dependency::Python.as_str());
        let ffmpeg_dir = packages_dir.join(Dependency::Ffmpeg.as_str());
        let aria2c_dir = packages_dir.join(Dependency::Aria2c.as_str());
        let ytdlp_dir = base_dir.join(YTDLP_DIR);

        let env = child_environment(&native_dir, &python_dir, &ffmpeg_dir, &aria2c_dir)?;

        Ok(Self {
            interpreter: native_dir.join(PYTHON_BIN),
            script: ytdlp_dir.join(YTDLP_BIN),
            ffmpeg: native_dir.join(FFMPEG_BIN),
            aria2c: native_dir.join(ARIA2C_BIN),
            base_dir,
            native_dir,
            packages_dir,
            python_dir,
            ffmpeg_dir,
            aria2c_dir,
            ytdlp_dir,
            env,
        })
    }

    /// Resolve paths from a validated config, applying its overrides.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let base_dir = match &cfg.paths.base_dir {
            Some(dir) => dir.clone(),
            None => default_base_dir()?,
        };
        let native_dir = cfg
            .paths
            .native_dir
            .clone()
            .unwrap_or_else(|| base_dir.join("bin"));

        let mut paths = Self::resolve(base_dir, native_dir)?;
        if let Some(p) = &cfg.paths.interpreter {
            paths = paths.with_interpreter(p);
        }
        if let Some(p) = &cfg.paths.script {
            paths = paths.with_script(p);
        }
        if let Some(p) = &cfg.paths.ffmpeg {
            paths = paths.with_ffmpeg(p);
        }
        if let Some(p) = &cfg.paths.aria2c {
            paths = paths.with_aria2c(p);
        }

        debug!(?paths, "resolved engine paths");
        Ok(paths)
    }

    pub fn with_interpreter(mut self, path: impl Into<PathBuf>) -> Self {
        self.interpreter = path.into();
        self
    }

    pub fn with_script(mut self, path: impl Into<PathBuf>) -> Self {
        self.script = path.into();
        self
    }

    pub fn with_ffmpeg(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg = path.into();
        self
    }

    pub fn with_aria2c(mut self, path: impl Into<PathBuf>) -> Self {
        self.aria2c = path.into();
        self
    }

    /// Create the directories the installer and updater write into.
    pub fn prepare_dirs(&self, fs: &dyn FileSystem) -> Result<()> {
        for dir in [&self.packages_dir, &self.ytdlp_dir, &self.native_dir] {
            fs.create_dir_all(dir)
                .map_err(|e| RunnerError::InitError(format!("{e:#}")))?;
        }
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn native_dir(&self) -> &Path {
        &self.native_dir
    }

    pub fn packages_dir(&self) -> &Path {
        &self.packages_dir
    }

    pub fn python_dir(&self) -> &Path {
        &self.python_dir
    }

    pub fn ytdlp_dir(&self) -> &Path {
        &self.ytdlp_dir
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn aria2c(&self) -> &Path {
        &self.aria2c
    }

    /// Binary whose presence means `dependency` is installed.
    pub fn dependency_binary(&self, dependency: Dependency) -> &Path {
        match dependency {
            Dependency::Python => &self.interpreter,
            Dependency::Ffmpeg => &self.ffmpeg,
            Dependency::Aria2c => &self.aria2c,
        }
    }

    /// Variables added to the inherited environment of every child.
    pub fn environment(&self) -> &[(String, OsString)] {
        &self.env
    }
}

fn default_base_dir() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|dir| dir.join("ytdlp-runner"))
        .ok_or_else(|| {
            RunnerError::InitError(
                "cannot determine a data directory; set [paths].base_dir".to_string(),
            )
        })
}

fn child_environment(
    native_dir: &Path,
    python_dir: &Path,
    ffmpeg_dir: &Path,
    aria2c_dir: &Path,
) -> Result<Vec<(String, OsString)>> {
    let python_home = python_dir.join("usr");

    let library_path = join_paths([
        python_home.join("lib"),
        ffmpeg_dir.join("usr/lib"),
        aria2c_dir.join("usr/lib"),
    ])?;

    let inherited = env::var_os("PATH").unwrap_or_default();
    let search_path = join_paths(
        env::split_paths(&inherited).chain(std::iter::once(native_dir.to_path_buf())),
    )?;

    Ok(vec![
        ("LD_LIBRARY_PATH".to_string(), library_path),
        (
            "SSL_CERT_FILE".to_string(),
            python_home.join("etc/tls/cert.pem").into_os_string(),
        ),
        ("PATH".to_string(), search_path),
        ("PYTHONHOME".to_string(), python_home.clone().into_os_string()),
        ("HOME".to_string(), python_home.into_os_string()),
    ])
}

fn join_paths<I>(paths: I) -> Result<OsString>
where
    I: IntoIterator<Item = PathBuf>,
{
    env::join_paths(paths).map_err(|e| RunnerError::InitError(format!("invalid search path: {e}")))
}
