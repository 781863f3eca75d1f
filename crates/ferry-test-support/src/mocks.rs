//! In-memory remote host with scripted failures.
//!
//! # Design
//! - `MemoryConnector` clones share one remote state, so tests keep a handle for inspection.
//! - Copies require the parent directory to exist, matching SCP behaviour.
//! - A connectivity fault marks the session broken; every later call on it fails.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ferry_remote::{
    Connector, RemoteError, RemoteResult, RemoteSession, TransferError, TransferResult,
    remote_parent, remote_prefixes,
};
use ssh2::ErrorCode;

const ENDPOINT: &str = "ingest@memory:22";
// libssh2 LIBSSH2_ERROR_SOCKET_DISCONNECT
const SOCKET_DISCONNECT: i32 = -13;
// SFTP status SSH_FX_PERMISSION_DENIED
const SFTP_PERMISSION_DENIED: i32 = 3;

#[derive(Debug, Default)]
struct RemoteState {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    connects: usize,
    open_sessions: usize,
    copies: Vec<String>,
    exists_calls: Vec<String>,
    mkdir_calls: Vec<String>,
    refuse_connects: usize,
    refuse_reconnects: usize,
    refuse_all: bool,
    fail_mkdir: bool,
    fail_copy: BTreeSet<String>,
    fail_exists: BTreeSet<String>,
    drop_on_copy: BTreeSet<String>,
    discard_copy: BTreeSet<String>,
    remove_on_exists: BTreeMap<String, PathBuf>,
}

/// Hands out [`MemorySession`]s backed by shared in-memory state.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    state: Arc<Mutex<RemoteState>>,
}

impl MemoryConnector {
    /// Empty remote host that accepts every connection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RemoteState> {
        lock(&self.state)
    }

    /// Seed a remote file, creating its parent directories.
    #[must_use]
    pub fn with_file(self, path: &str, contents: &[u8]) -> Self {
        {
            let mut state = self.state();
            if let Some(parent) = remote_parent(path) {
                state.dirs.extend(remote_prefixes(parent));
            }
            state.files.insert(path.to_string(), contents.to_vec());
        }
        self
    }

    /// Refuse the next `count` connection attempts.
    #[must_use]
    pub fn refuse_connections(self, count: usize) -> Self {
        self.state().refuse_connects = count;
        self
    }

    /// Accept the first connection, then refuse the next `count` attempts.
    #[must_use]
    pub fn refuse_reconnects(self, count: usize) -> Self {
        self.state().refuse_reconnects = count;
        self
    }

    /// Refuse every connection attempt.
    #[must_use]
    pub fn refuse_all_connections(self) -> Self {
        self.state().refuse_all = true;
        self
    }

    /// Fail every directory creation.
    #[must_use]
    pub fn fail_mkdir(self) -> Self {
        self.state().fail_mkdir = true;
        self
    }

    /// Reject copies to `remote` with a permission error.
    #[must_use]
    pub fn fail_copy_of(self, remote: &str) -> Self {
        self.state().fail_copy.insert(remote.to_string());
        self
    }

    /// Reject existence checks of `remote` with a permission error.
    #[must_use]
    pub fn fail_exists_of(self, remote: &str) -> Self {
        self.state().fail_exists.insert(remote.to_string());
        self
    }

    /// Break the connection in the middle of copying `remote`.
    #[must_use]
    pub fn drop_connection_on_copy_of(self, remote: &str) -> Self {
        self.state().drop_on_copy.insert(remote.to_string());
        self
    }

    /// Report success for copies of `remote` without storing the content.
    #[must_use]
    pub fn discard_copy_of(self, remote: &str) -> Self {
        self.state().discard_copy.insert(remote.to_string());
        self
    }

    /// Delete the local file `local` when `remote` is checked for existence, so hashing it fails afterwards.
    #[must_use]
    pub fn remove_local_on_exists_of(self, remote: &str, local: impl Into<PathBuf>) -> Self {
        self.state()
            .remove_on_exists
            .insert(remote.to_string(), local.into());
        self
    }

    /// Contents of a remote file.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state().files.get(path).cloned()
    }

    /// Every remote file path, sorted.
    #[must_use]
    pub fn file_paths(&self) -> Vec<String> {
        self.state().files.keys().cloned().collect()
    }

    /// Whether `path` exists as a remote directory.
    #[must_use]
    pub fn has_dir(&self, path: &str) -> bool {
        self.state().dirs.contains(path)
    }

    /// Successful and attempted connections.
    #[must_use]
    pub fn connects(&self) -> usize {
        self.state().connects
    }

    /// Sessions not yet dropped.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.state().open_sessions
    }

    /// Remote paths passed to `copy_file`, in call order.
    #[must_use]
    pub fn copy_calls(&self) -> Vec<String> {
        self.state().copies.clone()
    }

    /// Remote paths passed to `remote_exists`, in call order.
    #[must_use]
    pub fn exists_calls(&self) -> Vec<String> {
        self.state().exists_calls.clone()
    }

    /// Paths passed to `ensure_remote_dir`, in call order.
    #[must_use]
    pub fn mkdir_calls(&self) -> Vec<String> {
        self.state().mkdir_calls.clone()
    }
}

impl Connector for MemoryConnector {
    type Session = MemorySession;

    fn connect(&self) -> RemoteResult<MemorySession> {
        let mut state = self.state();
        state.connects += 1;
        let refuse_reconnect = state.connects > 1 && state.refuse_reconnects > 0;
        if state.refuse_all || state.refuse_connects > 0 || refuse_reconnect {
            if refuse_reconnect {
                state.refuse_reconnects -= 1;
            } else {
                state.refuse_connects = state.refuse_connects.saturating_sub(1);
            }
            return Err(RemoteError::Connect {
                endpoint: ENDPOINT.to_string(),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            });
        }
        state.open_sessions += 1;
        drop(state);
        Ok(MemorySession {
            state: Arc::clone(&self.state),
            broken: false,
        })
    }

    fn endpoint(&self) -> String {
        ENDPOINT.to_string()
    }
}

/// Session handle over the shared in-memory remote.
#[derive(Debug)]
pub struct MemorySession {
    state: Arc<Mutex<RemoteState>>,
    broken: bool,
}

impl MemorySession {
    fn check_alive(&self, target: &str) -> RemoteResult<()> {
        if self.broken {
            return Err(RemoteError::Path {
                operation: "memory.session",
                path: target.to_string(),
                source: ssh2::Error::new(
                    ErrorCode::Session(SOCKET_DISCONNECT),
                    "socket disconnected",
                ),
            });
        }
        Ok(())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.open_sessions = state.open_sessions.saturating_sub(1);
    }
}

impl RemoteSession for MemorySession {
    fn ensure_remote_dir(&mut self, path: &str) -> RemoteResult<()> {
        self.check_alive(path)?;
        let mut state = lock(&self.state);
        state.mkdir_calls.push(path.to_string());
        for prefix in remote_prefixes(path) {
            if state.files.contains_key(&prefix) {
                return Err(RemoteError::NotADirectory { path: prefix });
            }
            if state.dirs.contains(&prefix) {
                continue;
            }
            if state.fail_mkdir {
                return Err(permission_denied("memory.mkdir", prefix));
            }
            state.dirs.insert(prefix);
        }
        drop(state);
        Ok(())
    }

    fn remote_exists(&mut self, path: &str) -> RemoteResult<bool> {
        self.check_alive(path)?;
        let mut state = lock(&self.state);
        state.exists_calls.push(path.to_string());
        if let Some(local) = state.remove_on_exists.get(path) {
            let _ = fs::remove_file(local);
        }
        if state.fail_exists.contains(path) {
            return Err(permission_denied("memory.stat", path.to_string()));
        }
        Ok(state.files.contains_key(path) || state.dirs.contains(path))
    }

    fn copy_file(&mut self, local: &Path, remote: &str) -> TransferResult<u64> {
        self.check_alive(remote)
            .map_err(|source| TransferError::Session { source })?;
        let contents = fs::read(local).map_err(|source| TransferError::Local {
            operation: "memory.read",
            path: local.to_path_buf(),
            source,
        })?;

        let mut state = lock(&self.state);
        state.copies.push(remote.to_string());
        let stream_error = |kind| TransferError::Stream {
            remote_path: remote.to_string(),
            source: io::Error::from(kind),
        };
        if state.drop_on_copy.contains(remote) {
            drop(state);
            self.broken = true;
            return Err(stream_error(io::ErrorKind::BrokenPipe));
        }
        if state.fail_copy.contains(remote) {
            return Err(stream_error(io::ErrorKind::PermissionDenied));
        }
        if let Some(parent) = remote_parent(remote)
            && parent != "/"
            && !state.dirs.contains(parent)
        {
            return Err(stream_error(io::ErrorKind::NotFound));
        }

        let size = contents.len() as u64;
        if !state.discard_copy.contains(remote) {
            state.files.insert(remote.to_string(), contents);
        }
        Ok(size)
    }
}

fn permission_denied(operation: &'static str, path: String) -> RemoteError {
    RemoteError::Path {
        operation,
        path,
        source: ssh2::Error::new(ErrorCode::SFTP(SFTP_PERMISSION_DENIED), "permission denied"),
    }
}

fn lock(state: &Mutex<RemoteState>) -> MutexGuard<'_, RemoteState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
