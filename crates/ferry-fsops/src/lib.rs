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

//! Local filesystem operations for the upload pipeline: discovery, hashing, relocation.

pub mod checksum;
pub mod discovery;
pub mod error;
pub mod model;
pub mod relocate;

pub use checksum::sha256_file;
pub use discovery::{Candidates, Discovery, DiscoveryOptions};
pub use error::{FsOpsError, FsOpsResult};
pub use model::{Relocation, RelocationMode, UploadCandidate};
pub use relocate::Relocator;
