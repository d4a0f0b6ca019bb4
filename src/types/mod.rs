//! Core type definitions for syncat

mod action;
mod error;
mod record;

pub use action::SyncDecision;
pub use error::SyncError;
pub use record::{
    join_path, normalize_relative, resolve_relative, FileRecord, Locality, Timestamp,
    ROOT_RELATIVE_PATH,
};
