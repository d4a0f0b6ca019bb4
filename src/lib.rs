//! # syncat - catalog-backed one-way directory sync
//!
//! Every file's fingerprint, modification time and size are kept in a
//! SQLite catalog, so repeated runs only compare what changed. Targets can
//! be local directories or trees on a remote host reached over SSH.

// Module declarations
pub mod catalog;
pub mod commands;
pub mod config;
pub mod dedup;
pub mod diff;
pub mod executor;
pub mod fs;
pub mod hash;
pub mod logging;
pub mod reconcile;
pub mod remote;
pub mod scanner;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use catalog::Catalog;
pub use config::Config;
pub use types::{FileRecord, Locality, SyncDecision, SyncError, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
