//! `ssh2`-backed sessions: SCP for content, SFTP for directories and existence checks.
//!
//! # Design
//! - One TCP stream per session; libssh2 timeouts bound every blocking call.
//! - Host keys are checked only when a `known_hosts` file is configured.
//! - Field order guarantees the SFTP channel closes before the session disconnects.

use std::fs::{File, Metadata};
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use ferry_config::RemoteSettings;
use ssh2::{CheckResult, ErrorCode, KnownHostFileKind, Session, Sftp};
use tracing::{debug, info};

use crate::error::{RemoteError, RemoteResult, TransferError, TransferResult};
use crate::path::remote_prefixes;
use crate::session::{Connector, RemoteSession};

const COPY_CHUNK: usize = 1024 * 1024;
const SFTP_NO_SUCH_FILE: i32 = 2;
const SFTP_NO_SUCH_PATH: i32 = 10;
const DEFAULT_FILE_MODE: i32 = 0o644;
const DIRECTORY_MODE: i32 = 0o755;

/// Opens SSH sessions for the configured endpoint.
#[derive(Debug, Clone)]
pub struct SshConnector {
    settings: RemoteSettings,
}

impl SshConnector {
    /// Build a connector from remote settings.
    #[must_use]
    pub const fn new(settings: RemoteSettings) -> Self {
        Self { settings }
    }
}

impl Connector for SshConnector {
    type Session = SshSession;

    fn connect(&self) -> RemoteResult<SshSession> {
        let settings = &self.settings;
        let endpoint = settings.endpoint();
        let stream = connect_tcp(settings)?;

        let mut session = Session::new().map_err(|source| RemoteError::Session {
            operation: "session.new",
            source,
        })?;
        session.set_timeout(timeout_millis(settings.connect_timeout));
        session.set_tcp_stream(stream);
        session
            .handshake()
            .map_err(|source| RemoteError::Handshake {
                endpoint: endpoint.clone(),
                source,
            })?;

        if let Some(known_hosts) = &settings.known_hosts {
            verify_host_key(&session, settings, known_hosts)?;
        }

        let passphrase = settings.key_passphrase.as_ref().map(|secret| secret.expose());
        session
            .userauth_pubkey_file(&settings.user, None, &settings.key_path, passphrase)
            .map_err(|source| RemoteError::Authentication {
                endpoint: endpoint.clone(),
                key_path: settings.key_path.clone(),
                source,
            })?;
        if !session.authenticated() {
            return Err(RemoteError::Unauthenticated { endpoint });
        }

        let sftp = session.sftp().map_err(|source| RemoteError::Session {
            operation: "sftp.open",
            source,
        })?;
        info!(endpoint = %endpoint, "remote session established");
        Ok(SshSession {
            sftp,
            session: ConnectedSession { session, endpoint },
        })
    }

    fn endpoint(&self) -> String {
        self.settings.endpoint()
    }
}

/// Authenticated SSH session with an open SFTP channel.
pub struct SshSession {
    sftp: Sftp,
    session: ConnectedSession,
}

impl std::fmt::Debug for SshSession {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SshSession")
            .field("endpoint", &self.session.endpoint)
            .finish_non_exhaustive()
    }
}

struct ConnectedSession {
    session: Session,
    endpoint: String,
}

impl Drop for ConnectedSession {
    fn drop(&mut self) {
        match self.session.disconnect(None, "ferry run finished", None) {
            Ok(()) => debug!(endpoint = %self.endpoint, "remote session closed"),
            Err(err) => debug!(endpoint = %self.endpoint, error = %err, "remote disconnect failed"),
        }
    }
}

impl RemoteSession for SshSession {
    fn ensure_remote_dir(&mut self, path: &str) -> RemoteResult<()> {
        for prefix in remote_prefixes(path) {
            let target = Path::new(&prefix);
            match self.sftp.stat(target) {
                Ok(stat) if stat.is_dir() => {}
                Ok(_) => return Err(RemoteError::NotADirectory { path: prefix }),
                Err(err) if is_not_found(&err) => {
                    if let Err(source) = self.sftp.mkdir(target, DIRECTORY_MODE) {
                        // another writer may have created it in between
                        if self.sftp.stat(target).is_ok_and(|stat| stat.is_dir()) {
                            continue;
                        }
                        return Err(RemoteError::Path {
                            operation: "sftp.mkdir",
                            path: prefix,
                            source,
                        });
                    }
                    debug!(path = %prefix, "created remote directory");
                }
                Err(source) => {
                    return Err(RemoteError::Path {
                        operation: "sftp.stat",
                        path: prefix,
                        source,
                    });
                }
            }
        }
        Ok(())
    }

    fn remote_exists(&mut self, path: &str) -> RemoteResult<bool> {
        match self.sftp.stat(Path::new(path)) {
            Ok(_) => Ok(true),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(source) => Err(RemoteError::Path {
                operation: "sftp.stat",
                path: path.to_string(),
                source,
            }),
        }
    }

    fn copy_file(&mut self, local: &Path, remote: &str) -> TransferResult<u64> {
        let mut file = File::open(local).map_err(|source| local_failure("copy.open", local, source))?;
        let metadata = file
            .metadata()
            .map_err(|source| local_failure("copy.metadata", local, source))?;
        let mut channel = self
            .session
            .session
            .scp_send(Path::new(remote), file_mode(&metadata), metadata.len(), None)
            .map_err(|source| channel_failure("scp.open", remote, source))?;

        let sent = stream_exact(&mut file, &mut channel, metadata.len(), local, remote)?;

        channel
            .send_eof()
            .map_err(|source| channel_failure("scp.send_eof", remote, source))?;
        channel
            .wait_eof()
            .map_err(|source| channel_failure("scp.wait_eof", remote, source))?;
        channel
            .close()
            .map_err(|source| channel_failure("scp.close", remote, source))?;
        channel
            .wait_close()
            .map_err(|source| channel_failure("scp.wait_close", remote, source))?;
        debug!(remote_path = %remote, bytes = sent, "copied file");
        Ok(sent)
    }
}

/// Copy exactly `len` bytes from `source` to `sink`, failing when the source holds a different amount.
fn stream_exact(
    source: &mut impl Read,
    sink: &mut impl Write,
    len: u64,
    local: &Path,
    remote: &str,
) -> TransferResult<u64> {
    let mut limited = source.take(len);
    let mut buffer = vec![0_u8; COPY_CHUNK];
    let mut sent: u64 = 0;
    loop {
        let read = match limited.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(local_failure("copy.read", local, err)),
        };
        sink.write_all(&buffer[..read])
            .map_err(|source| TransferError::Stream {
                remote_path: remote.to_string(),
                source,
            })?;
        sent += read as u64;
    }

    let extra = io::copy(limited.into_inner(), &mut io::sink())
        .map_err(|err| local_failure("copy.read", local, err))?;
    if sent != len || extra > 0 {
        return Err(TransferError::SizeChanged {
            path: local.to_path_buf(),
            expected: len,
            actual: sent + extra,
        });
    }
    Ok(sent)
}

fn local_failure(operation: &'static str, path: &Path, source: io::Error) -> TransferError {
    TransferError::Local {
        operation,
        path: path.to_path_buf(),
        source,
    }
}

fn channel_failure(operation: &'static str, remote: &str, source: ssh2::Error) -> TransferError {
    TransferError::Channel {
        operation,
        remote_path: remote.to_string(),
        source,
    }
}

fn connect_tcp(settings: &RemoteSettings) -> RemoteResult<TcpStream> {
    let connect_err = |source| RemoteError::Connect {
        endpoint: settings.endpoint(),
        source,
    };
    let addresses = (settings.host.as_str(), settings.port)
        .to_socket_addrs()
        .map_err(connect_err)?;

    let mut last_error = None;
    for address in addresses {
        match TcpStream::connect_timeout(&address, settings.connect_timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                debug!(address = %address, error = %err, "tcp connect attempt failed");
                last_error = Some(err);
            }
        }
    }
    Err(connect_err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
    })))
}

fn verify_host_key(
    session: &Session,
    settings: &RemoteSettings,
    known_hosts: &Path,
) -> RemoteResult<()> {
    let rejected = |reason| RemoteError::HostKey {
        endpoint: settings.endpoint(),
        reason,
    };
    let (key, _) = session.host_key().ok_or_else(|| rejected("no_host_key"))?;
    let mut known = session.known_hosts().map_err(|source| RemoteError::Session {
        operation: "known_hosts.init",
        source,
    })?;
    known
        .read_file(known_hosts, KnownHostFileKind::OpenSSH)
        .map_err(|source| RemoteError::Session {
            operation: "known_hosts.read",
            source,
        })?;
    match known.check_port(&settings.host, settings.port, key) {
        CheckResult::Match => Ok(()),
        CheckResult::NotFound => Err(rejected("unknown_host")),
        CheckResult::Mismatch => Err(rejected("mismatch")),
        CheckResult::Failure => Err(rejected("check_failed")),
    }
}

fn is_not_found(error: &ssh2::Error) -> bool {
    matches!(
        error.code(),
        ErrorCode::SFTP(SFTP_NO_SUCH_FILE | SFTP_NO_SUCH_PATH)
    )
}

fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX)
}

#[cfg(unix)]
fn file_mode(metadata: &Metadata) -> i32 {
    use std::os::unix::fs::PermissionsExt;

    i32::try_from(metadata.permissions().mode() & 0o777).unwrap_or(DEFAULT_FILE_MODE)
}

#[cfg(not(unix))]
fn file_mode(_metadata: &Metadata) -> i32 {
    DEFAULT_FILE_MODE
}
