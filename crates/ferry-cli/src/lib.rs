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
#![allow(clippy::redundant_pub_crate)]

//! Command-line front end for ferry uploads.
//!
//! Layout: `cli.rs` (flags, error mapping, entry point), `output.rs` (final tally).

pub(crate) mod cli;
pub(crate) mod output;

pub use cli::run;
