// src/exec/registry.rs

//! Registry of in-flight invocations, keyed by caller-chosen process id.
//!
//! The registry never owns the child process itself. Each entry holds the
//! kill side of a `oneshot` channel whose receiver is watched by the
//! invocation that owns the child. Terminating an id removes its entry and
//! fires that channel under one lock acquisition; the owning invocation then
//! kills the child and, seeing its id gone, reports the run as cancelled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::errors::{Result, RunnerError};

/// Handle to a live child, as stored in the registry.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Option<u32>,
    kill: oneshot::Sender<()>,
}

impl ProcessHandle {
    pub fn new(pid: Option<u32>, kill: oneshot::Sender<()>) -> Self {
        Self { pid, kill }
    }

    /// A handle is alive while its owning invocation still listens for kills.
    pub fn is_alive(&self) -> bool {
        !self.kill.is_closed()
    }
}

/// Read-only view of a registered process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: Option<u32>,
    pub alive: bool,
}

struct Entry {
    token: u64,
    handle: ProcessHandle,
}

/// Identifies one registration, so an invocation only ever removes its own
/// entry even if the id was cancelled and reused meanwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationToken(u64);

/// Concurrent id -> process map. Clones share the same entries.
#[derive(Clone, Default)]
pub struct ProcessRegistry {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    next_token: Arc<AtomicU64>,
}

impl std::fmt::Debug for ProcessRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under `id`.
    ///
    /// Fails with [`RunnerError::DuplicateProcessId`] if `id` is already
    /// registered; the existing entry is left untouched.
    pub fn register(&self, id: &str, handle: ProcessHandle) -> Result<RegistrationToken> {
        let mut entries = self.lock();
        if entries.contains_key(id) {
            return Err(RunnerError::DuplicateProcessId(id.to_string()));
        }
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        debug!(id, pid = ?handle.pid, "registering process");
        entries.insert(id.to_string(), Entry { token, handle });
        Ok(RegistrationToken(token))
    }

    pub fn lookup(&self, id: &str) -> Option<ProcessInfo> {
        self.lock().get(id).map(|entry| ProcessInfo {
            pid: entry.handle.pid,
            alive: entry.handle.is_alive(),
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    /// True if `id` is still registered by the registration `token` names.
    pub fn holds(&self, id: &str, token: RegistrationToken) -> bool {
        self.lock()
            .get(id)
            .is_some_and(|entry| entry.token == token.0)
    }

    /// Remove `id` regardless of who registered it.
    pub fn unregister(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Remove `id` only if it still belongs to `token`.
    pub fn release(&self, id: &str, token: RegistrationToken) -> bool {
        let mut entries = self.lock();
        if entries.get(id).is_some_and(|entry| entry.token == token.0) {
            entries.remove(id);
            true
        } else {
            false
        }
    }

    /// Kill the process registered under `id` and remove it.
    ///
    /// Returns `true` only if a live process was found and signalled. Absent
    /// or already-finished processes yield `false` (dead entries are left for
    /// their owner to clean up), so cancelling twice is harmless.
    pub fn terminate(&self, id: &str) -> bool {
        let mut entries = self.lock();
        if !entries.get(id).is_some_and(|entry| entry.handle.is_alive()) {
            debug!(id, "terminate: no live process registered");
            return false;
        }
        let Some(entry) = entries.remove(id) else {
            return false;
        };
        let killed = entry.handle.kill.send(()).is_ok();
        info!(id, pid = ?entry.handle.pid, killed, "terminate requested");
        killed
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
