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

//! Environment-backed configuration for the ferry upload pipeline.
//!
//! Layout: `model.rs` (typed settings and overrides), `loader.rs` (environment
//! sources and assembly), `validate.rs` (parsing/validation helpers),
//! `defaults.rs` (variable names and default values).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{DotEnv, EnvSource, ProcessEnv};
pub use model::{LocalPaths, Passphrase, RemoteSettings, Settings, SettingsOverrides};
