#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Remote session abstraction and its SSH implementation.

pub mod error;
pub mod path;
pub mod session;
pub mod ssh;

pub use error::{RemoteError, RemoteResult, TransferError, TransferResult};
pub use path::{join_remote, remote_parent, remote_prefixes};
pub use session::{Connector, RemoteSession};
pub use ssh::{SshConnector, SshSession};
