//! Seams between the upload pipeline and a remote host.

use std::path::Path;

use crate::error::{RemoteResult, TransferResult};

/// One authenticated connection to the remote host.
///
/// Dropping the handle closes the connection.
pub trait RemoteSession {
    /// Create `path` and any missing parents; succeeds when it already exists.
    ///
    /// # Errors
    ///
    /// Returns a `RemoteError` when a prefix cannot be inspected or created.
    fn ensure_remote_dir(&mut self, path: &str) -> RemoteResult<()>;

    /// Whether `path` exists on the remote host.
    ///
    /// # Errors
    ///
    /// Returns a `RemoteError` for any failure other than "no such file".
    fn remote_exists(&mut self, path: &str) -> RemoteResult<bool>;

    /// Copy `local` to `remote`, returning the number of bytes sent. Does not verify.
    ///
    /// # Errors
    ///
    /// Returns a `TransferError` when the local read or remote write fails.
    fn copy_file(&mut self, local: &Path, remote: &str) -> TransferResult<u64>;
}

/// Produces fresh [`RemoteSession`] handles.
pub trait Connector {
    /// Session type handed out by this connector.
    type Session: RemoteSession;

    /// Open and authenticate a new session.
    ///
    /// # Errors
    ///
    /// Returns a `RemoteError` when the host is unreachable or rejects the login.
    fn connect(&self) -> RemoteResult<Self::Session>;

    /// `user@host:port` label for logs.
    fn endpoint(&self) -> String;
}
