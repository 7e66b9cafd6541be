#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use ytdlp_runner::config::EnginePaths;
use ytdlp_runner::exec::{Engine, ProcessRegistry};

/// Engine whose "managed script" is a shell script run by `/bin/sh`.
///
/// The script body receives the full argument list in `"$@"`, so tests can
/// assert on what the engine passed, print progress lines, write to stderr
/// and pick an exit code.
pub struct ScriptFixture {
    dir: TempDir,
    paths: EnginePaths,
}

impl ScriptFixture {
    pub fn new(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let script = dir.path().join("yt-dlp.sh");
        fs::write(&script, format!("{body}\n")).expect("write script");

        let paths = EnginePaths::resolve(dir.path().join("base"), dir.path().join("bin"))
            .expect("resolve paths")
            .with_interpreter("/bin/sh")
            .with_script(&script)
            .with_ffmpeg(dir.path().join("bin/ffmpeg"));

        Self { dir, paths }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> &EnginePaths {
        &self.paths
    }

    pub fn script(&self) -> PathBuf {
        self.paths.script().to_path_buf()
    }

    pub fn engine(&self) -> Engine {
        Engine::new(self.paths.clone())
    }

    pub fn engine_with_registry(&self, registry: ProcessRegistry) -> Engine {
        Engine::with_registry(self.paths.clone(), registry)
    }

    /// Path of a marker file inside the fixture dir, for scripts that signal
    /// they have started.
    pub fn marker(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Script that prints each argument on its own line.
pub const ECHO_ARGS: &str = r#"printf '%s\n' "$@""#;

/// Poll `check` every 10ms until it holds or `limit` elapses.
pub async fn wait_until<F>(limit: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
