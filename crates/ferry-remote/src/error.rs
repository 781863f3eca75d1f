//! # Design
//!
//! - Separate session-level failures (`RemoteError`) from copy failures (`TransferError`).
//! - Every variant answers `is_connectivity()` so callers can decide whether the session is still usable.
//! - Messages stay constant; hosts, paths, and operations live in fields.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// libssh2 session error codes that mean the transport itself is gone or stalled.
const CONNECTIVITY_CODES: &[i32] = &[
    -1,  // LIBSSH2_ERROR_SOCKET_NONE
    -2,  // LIBSSH2_ERROR_BANNER_RECV
    -3,  // LIBSSH2_ERROR_BANNER_SEND
    -5,  // LIBSSH2_ERROR_KEX_FAILURE
    -7,  // LIBSSH2_ERROR_SOCKET_SEND
    -9,  // LIBSSH2_ERROR_TIMEOUT
    -13, // LIBSSH2_ERROR_SOCKET_DISCONNECT
    -30, // LIBSSH2_ERROR_SOCKET_TIMEOUT
    -43, // LIBSSH2_ERROR_SOCKET_RECV
];

/// Result alias for session-level operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Result alias for file copies.
pub type TransferResult<T> = Result<T, TransferError>;

/// Failures while establishing or using a remote session.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// TCP connection could not be established.
    #[error("remote connect failed")]
    Connect {
        /// `user@host:port` label.
        endpoint: String,
        /// Underlying socket error.
        source: io::Error,
    },
    /// SSH handshake failed.
    #[error("remote handshake failed")]
    Handshake {
        /// `user@host:port` label.
        endpoint: String,
        /// Underlying libssh2 error.
        source: ssh2::Error,
    },
    /// Public-key authentication was rejected.
    #[error("remote authentication failed")]
    Authentication {
        /// `user@host:port` label.
        endpoint: String,
        /// Private key that was offered.
        key_path: PathBuf,
        /// Underlying libssh2 error.
        source: ssh2::Error,
    },
    /// The server accepted the key exchange but not the login.
    #[error("remote session not authenticated")]
    Unauthenticated {
        /// `user@host:port` label.
        endpoint: String,
    },
    /// The server host key did not pass `known_hosts` verification.
    #[error("remote host key rejected")]
    HostKey {
        /// `user@host:port` label.
        endpoint: String,
        /// Static reason (`unknown_host`, `mismatch`, ...).
        reason: &'static str,
    },
    /// A session-level libssh2 call failed.
    #[error("remote session failure")]
    Session {
        /// Operation that failed.
        operation: &'static str,
        /// Underlying libssh2 error.
        source: ssh2::Error,
    },
    /// A path-level SFTP call failed.
    #[error("remote path operation failed")]
    Path {
        /// Operation that failed.
        operation: &'static str,
        /// Remote path involved.
        path: String,
        /// Underlying libssh2 error.
        source: ssh2::Error,
    },
    /// A remote path exists but is not a directory.
    #[error("remote path is not a directory")]
    NotADirectory {
        /// Remote path involved.
        path: String,
    },
}

impl RemoteError {
    /// Whether the failure means the session should be discarded.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Connect { .. }
            | Self::Handshake { .. }
            | Self::Authentication { .. }
            | Self::Unauthenticated { .. }
            | Self::HostKey { .. }
            | Self::Session { .. } => true,
            Self::Path { source, .. } => ssh_is_connectivity(source),
            Self::NotADirectory { .. } => false,
        }
    }
}

/// Failures while copying a single file to the remote host.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The local file could not be opened or read.
    #[error("transfer local io failure")]
    Local {
        /// Operation that failed.
        operation: &'static str,
        /// Local file involved.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The SCP channel could not be opened or closed cleanly.
    #[error("transfer channel failure")]
    Channel {
        /// Operation that failed.
        operation: &'static str,
        /// Destination path.
        remote_path: String,
        /// Underlying libssh2 error.
        source: ssh2::Error,
    },
    /// Writing file content to the channel failed.
    #[error("transfer stream failure")]
    Stream {
        /// Destination path.
        remote_path: String,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The local file changed size between the SCP header and the end of the stream.
    #[error("local file size changed during copy")]
    SizeChanged {
        /// Local file involved.
        path: PathBuf,
        /// Size announced in the SCP header.
        expected: u64,
        /// Bytes the file actually held.
        actual: u64,
    },
    /// No usable session was available for the copy.
    #[error("transfer session unavailable")]
    Session {
        /// Session error that prevented the copy.
        source: RemoteError,
    },
}

impl TransferError {
    /// Whether the failure means the session should be discarded.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Local { .. } | Self::SizeChanged { .. } => false,
            Self::Channel { source, .. } => ssh_is_connectivity(source),
            Self::Stream { source, .. } => io_is_connectivity(source),
            Self::Session { source } => source.is_connectivity(),
        }
    }
}

fn ssh_is_connectivity(error: &ssh2::Error) -> bool {
    matches!(error.code(), ssh2::ErrorCode::Session(code) if CONNECTIVITY_CODES.contains(&code))
}

fn io_is_connectivity(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::NotConnected
            | io::ErrorKind::TimedOut
            | io::ErrorKind::UnexpectedEof
    )
}
