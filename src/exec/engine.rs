// src/exec/engine.rs

//! Execution engine: runs the managed script under the bundled interpreter,
//! drains both output pipes, and turns the exit status into a [`RunResult`]
//! or a typed [`RunnerError`].

use std::future::{self, Future};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::EnginePaths;
use crate::errors::{Result, RunnerError};

use super::info::VideoInfo;
use super::progress::ProgressCallback;
use super::reader::{read_plain, read_with_progress};
use super::registry::{ProcessHandle, ProcessRegistry, RegistrationToken};
use super::request::{build_command, Request};

pub const OPT_CACHE_DIR: &str = "--cache-dir";
pub const OPT_NO_CACHE_DIR: &str = "--no-cache-dir";
pub const OPT_FFMPEG_LOCATION: &str = "--ffmpeg-location";
pub const OPT_DUMP_JSON: &str = "--dump-json";
pub const OPT_IGNORE_ERRORS: &str = "--ignore-errors";

/// Outcome of one successful (or tolerated) invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    command: Vec<String>,
    exit_code: i32,
    elapsed: Duration,
    out: String,
    err: String,
}

impl RunResult {
    /// Full argument vector that was executed, program first.
    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn out(&self) -> &str {
        &self.out
    }

    pub fn err(&self) -> &str {
        &self.err
    }
}

/// Drives child processes. Cheap to clone; clones share the registry, so
/// one clone can cancel an invocation started through another.
#[derive(Debug, Clone)]
pub struct Engine {
    paths: Arc<EnginePaths>,
    registry: ProcessRegistry,
}

impl Engine {
    pub fn new(paths: EnginePaths) -> Self {
        Self::with_registry(paths, ProcessRegistry::new())
    }

    pub fn with_registry(paths: EnginePaths, registry: ProcessRegistry) -> Self {
        Self {
            paths: Arc::new(paths),
            registry,
        }
    }

    pub fn paths(&self) -> &EnginePaths {
        &self.paths
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    /// Kill the invocation registered under `id`. See [`ProcessRegistry::terminate`].
    pub fn cancel(&self, id: &str) -> bool {
        self.registry.terminate(id)
    }

    /// Apply the engine's forced options to a copy of `request`.
    ///
    /// Caching is disabled unless the caller chose a cache directory, and the
    /// media-tool location always points at the resolved binary.
    pub fn normalize(&self, request: &Request) -> Request {
        let mut normalized = request.clone();
        if normalized.option_value(OPT_CACHE_DIR).is_none() {
            normalized.set_option(OPT_NO_CACHE_DIR, None);
        }
        normalized.set_option(
            OPT_FFMPEG_LOCATION,
            Some(self.paths.ffmpeg().to_string_lossy().into_owned()),
        );
        normalized
    }

    /// `[interpreter, script, ...arguments]` for an already normalized request.
    pub fn command_line(&self, normalized: &Request) -> Vec<String> {
        let mut command = vec![
            self.paths.interpreter().to_string_lossy().into_owned(),
            self.paths.script().to_string_lossy().into_owned(),
        ];
        command.extend(build_command(normalized));
        command
    }

    /// Run `request` to completion.
    ///
    /// When `id` is given the run can be cancelled with [`Engine::cancel`];
    /// a cancelled run fails with [`RunnerError::Cancelled`].
    pub async fn execute(
        &self,
        request: &Request,
        id: Option<&str>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<RunResult> {
        self.execute_until(request, id, on_progress, future::pending())
            .await
    }

    /// Like [`Engine::execute`], but gives up when `interrupt` resolves: the
    /// child is killed, `id` unregistered, and [`RunnerError::Interrupted`]
    /// returned.
    pub async fn execute_until<F>(
        &self,
        request: &Request,
        id: Option<&str>,
        on_progress: Option<ProgressCallback>,
        interrupt: F,
    ) -> Result<RunResult>
    where
        F: Future<Output = ()>,
    {
        self.ensure_initialized()?;

        if let Some(id) = id {
            if self.registry.contains(id) {
                return Err(RunnerError::DuplicateProcessId(id.to_string()));
            }
        }

        let normalized = self.normalize(request);
        let command = self.command_line(&normalized);
        let mut child = self.spawn(&command)?;
        let pid = child.id();

        let (kill_tx, mut kill_rx) = oneshot::channel::<()>();
        let registration = match id {
            Some(id) => match self.registry.register(id, ProcessHandle::new(pid, kill_tx)) {
                Ok(token) => Some(Registration {
                    registry: &self.registry,
                    id,
                    token,
                }),
                Err(e) => {
                    force_kill(&mut child);
                    return Err(e);
                }
            },
            None => None,
        };
        let mut kill_armed = registration.is_some();

        info!(id = ?id, pid = ?pid, args = command.len() - 2, "started process");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let started = Instant::now();

        let stdout_task = tokio::spawn(async move {
            match stdout {
                Some(pipe) => read_with_progress(pipe, on_progress).await,
                None => String::new(),
            }
        });
        let stderr_task = tokio::spawn(async move {
            match stderr {
                Some(pipe) => read_plain(pipe).await,
                None => String::new(),
            }
        });

        let readers = async { tokio::join!(stdout_task, stderr_task) };
        tokio::pin!(readers);
        tokio::pin!(interrupt);

        // Drain both pipes fully before looking at the exit status.
        let (out, err) = loop {
            tokio::select! {
                (out, err) = &mut readers => {
                    let out = out.map_err(anyhow::Error::from)?;
                    let err = err.map_err(anyhow::Error::from)?;
                    break (out, err);
                }
                res = &mut kill_rx, if kill_armed => {
                    kill_armed = false;
                    if res.is_ok() {
                        info!(id = ?id, pid = ?pid, "cancellation received; killing process");
                        force_kill(&mut child);
                    }
                }
                () = &mut interrupt => {
                    return Err(interrupted(&mut child, id).await);
                }
            }
        };

        let status = loop {
            tokio::select! {
                status = child.wait() => break status?,
                res = &mut kill_rx, if kill_armed => {
                    kill_armed = false;
                    if res.is_ok() {
                        info!(id = ?id, pid = ?pid, "cancellation received; killing process");
                        force_kill(&mut child);
                    }
                }
                () = &mut interrupt => {
                    return Err(interrupted(&mut child, id).await);
                }
            }
        };
        // From here on a late terminate() sees a dead handle and does nothing.
        kill_rx.close();

        let elapsed = started.elapsed();
        let exit_code = exit_code_of(&status);
        info!(id = ?id, pid = ?pid, exit_code, elapsed_ms = elapsed.as_millis() as u64, "process exited");

        if exit_code != 0 {
            if let Some(reg) = &registration {
                if !reg.is_held() {
                    info!(id = reg.id, exit_code, "process was cancelled");
                    return Err(RunnerError::Cancelled(reg.id.to_string()));
                }
            }

            if failure_tolerated(&normalized, &out) {
                warn!(id = ?id, exit_code, "non-zero exit tolerated (--dump-json with --ignore-errors)");
            } else {
                return Err(RunnerError::ProcessFailed {
                    code: exit_code,
                    stderr: err,
                });
            }
        }

        drop(registration);

        Ok(RunResult {
            command,
            exit_code,
            elapsed,
            out,
            err,
        })
    }

    /// Fetch metadata for `url` without downloading it.
    pub async fn get_info(&self, url: &str) -> Result<VideoInfo> {
        let mut request = Request::new(url);
        request.add_option(OPT_DUMP_JSON);
        let result = self.execute(&request, None, None).await?;
        VideoInfo::from_json(result.out())
    }

    fn ensure_initialized(&self) -> Result<()> {
        for (what, path) in [
            ("interpreter", self.paths.interpreter()),
            ("script", self.paths.script()),
        ] {
            if !path.is_file() {
                return Err(RunnerError::InitError(format!(
                    "{what} not found at {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }

    fn spawn(&self, command: &[String]) -> Result<Child> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| RunnerError::InitError("empty command line".to_string()))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(self.paths.environment().iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so a kill also reaches the tools the script
        // starts and nothing keeps our pipes open.
        #[cfg(unix)]
        cmd.process_group(0);

        debug!(?command, "spawning process");
        cmd.spawn().map_err(RunnerError::SpawnError)
    }
}

/// Removes the registry entry when the invocation ends, however it ends.
struct Registration<'a> {
    registry: &'a ProcessRegistry,
    id: &'a str,
    token: RegistrationToken,
}

impl Registration<'_> {
    fn is_held(&self) -> bool {
        self.registry.holds(self.id, self.token)
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.registry.release(self.id, self.token);
    }
}

/// A non-zero exit is downgraded to success when JSON output was requested
/// with `--ignore-errors` and something was printed anyway.
fn failure_tolerated(request: &Request, out: &str) -> bool {
    request.has_option(OPT_DUMP_JSON) && !out.is_empty() && request.has_option(OPT_IGNORE_ERRORS)
}

/// Platform exit code; on unix a signal death is reported as the negated
/// signal number. Anything else without a code is `-1`.
fn exit_code_of(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

async fn interrupted(child: &mut Child, id: Option<&str>) -> RunnerError {
    warn!(id = ?id, "interrupted while waiting; killing process");
    force_kill(child);
    if let Err(e) = child.wait().await {
        warn!(id = ?id, error = %e, "failed to reap interrupted process");
    }
    RunnerError::Interrupted
}

fn force_kill(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
            if e != nix::errno::Errno::ESRCH {
                warn!(pid, error = %e, "failed to kill process group");
            }
        }
    }

    if let Err(e) = child.start_kill() {
        debug!(error = %e, "start_kill failed; process may have exited already");
    }
}
