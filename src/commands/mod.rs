//! Command orchestration

pub mod dupes;
pub mod sync;
