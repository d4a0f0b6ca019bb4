//! Executor - copy primitive invocation, retry and catalog update

pub mod copy;

use crate::catalog::Catalog;
use crate::diff::{DiffPlan, PlannedFile};
use crate::fs::FileSystem;
use crate::types::{join_path, FileRecord, Locality, SyncDecision, SyncError};
use std::path::{Path, MAIN_SEPARATOR_STR};
use tracing::{debug, info, warn};

pub use copy::copy_file_atomic;

/// Attempts per file before a remote transfer is given up
pub const MAX_TRANSFER_ATTEMPTS: u32 = 3;

/// Copy counters for a run.
#[derive(Debug, Default)]
pub struct ExecutionStats {
    /// Copied with no prior target record.
    pub copied: usize,
    /// Source files that had a target record to compare against.
    pub compared: usize,
    /// Identical content on both sides.
    pub kept: usize,
    /// Overwritten because the source was more recent.
    pub newer: usize,
    /// Left alone because the target was as recent or more recent.
    pub older: usize,
    /// Copies that did not complete.
    pub failed: usize,
    /// Bytes written to the target (bytes that would be written, when simulating).
    pub bytes_copied: u64,
    /// One entry per failed copy, in plan order.
    pub failures: Vec<FailedCopy>,
}

impl ExecutionStats {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// A copy that failed, kept for the run summary.
#[derive(Debug)]
pub struct FailedCopy {
    pub path: String,
    pub error: SyncError,
}

/// Events emitted while executing a plan.
#[derive(Debug)]
pub enum ExecutionEvent<'a> {
    /// A copy is about to start.
    CopyStart {
        index: usize,
        total: usize,
        action: &'static str,
        path: &'a str,
    },
    /// A copy completed and the target record was written.
    CopySuccess {
        index: usize,
        total: usize,
        action: &'static str,
        path: &'a str,
        bytes_copied: u64,
    },
    /// A copy failed; execution continues with the next file.
    CopyError {
        index: usize,
        total: usize,
        action: &'static str,
        path: &'a str,
        error: &'a SyncError,
    },
    /// Every entry has been processed.
    Complete { stats: &'a ExecutionStats },
}

/// Optional callback used to receive execution events.
pub type ExecutionCallback = dyn Fn(&ExecutionEvent<'_>) + Send + Sync;

/// Execute a diff plan against the target filesystem
///
/// Entries are processed strictly in plan order. A failed copy is recorded
/// and skipped; the target record is upserted only after a copy succeeds, so
/// the catalog never claims a file the target does not have. In simulate mode
/// no copy primitive runs and the catalog is not touched, but the counters
/// come out exactly as a real run's would.
///
/// Catalog failures abort execution.
pub fn execute_plan(
    plan: &DiffPlan,
    catalog: &mut Catalog,
    target: &mut dyn FileSystem,
    simulate: bool,
    on_event: Option<&ExecutionCallback>,
) -> Result<ExecutionStats, SyncError> {
    let mut stats = ExecutionStats::default();
    let total = plan.stats.transfer_files;
    let mut index = 0;

    for entry in &plan.entries {
        if entry.decision.was_compared() {
            stats.compared += 1;
        }
        match entry.decision {
            SyncDecision::Keep => {
                stats.kept += 1;
                continue;
            }
            SyncDecision::Older => {
                debug!(
                    "Target is as recent as {}, left alone",
                    entry.source.full_path(MAIN_SEPARATOR_STR)
                );
                stats.older += 1;
                continue;
            }
            SyncDecision::Copy | SyncDecision::Newer => {}
        }

        index += 1;
        let action = entry.decision.action_name();
        let target_path = join_path(&entry.target_directory, &entry.source.name, target.separator());
        emit_event(
            on_event,
            ExecutionEvent::CopyStart {
                index,
                total,
                action,
                path: &target_path,
            },
        );

        let result = if simulate {
            info!("[simulate] {} {}", action, target_path);
            Ok(entry.source.size)
        } else {
            copy_entry(entry, &plan.target_root, catalog, target)
        };

        match result {
            Ok(bytes) => {
                if entry.decision == SyncDecision::Copy {
                    stats.copied += 1;
                } else {
                    stats.newer += 1;
                }
                stats.bytes_copied += bytes;
                emit_event(
                    on_event,
                    ExecutionEvent::CopySuccess {
                        index,
                        total,
                        action,
                        path: &target_path,
                        bytes_copied: bytes,
                    },
                );
            }
            Err(error @ SyncError::Catalog(_)) => return Err(error),
            Err(error) => {
                warn!("{} {} failed: {}", action, target_path, error);
                stats.failed += 1;
                emit_event(
                    on_event,
                    ExecutionEvent::CopyError {
                        index,
                        total,
                        action,
                        path: &target_path,
                        error: &error,
                    },
                );
                stats.failures.push(FailedCopy {
                    path: target_path,
                    error,
                });
            }
        }
    }

    emit_event(on_event, ExecutionEvent::Complete { stats: &stats });
    Ok(stats)
}

/// Copy one entry and record it on the target side of the catalog
fn copy_entry(
    entry: &PlannedFile,
    target_root: &str,
    catalog: &mut Catalog,
    target: &mut dyn FileSystem,
) -> Result<u64, SyncError> {
    let source_path = entry.source.full_path(MAIN_SEPARATOR_STR);
    let bytes = copy_with_retry(
        target,
        Path::new(&source_path),
        &entry.target_directory,
        &entry.source.name,
    )?;

    catalog.upsert(&FileRecord {
        directory: entry.target_directory.clone(),
        name: entry.source.name.clone(),
        fingerprint: entry.source.fingerprint.clone(),
        modified_at: entry.source.modified_at.clone(),
        size: entry.source.size,
        tree_root: target_root.to_string(),
        relative_path: entry.source.relative_path.clone(),
        locality: target.locality(),
    })?;
    Ok(bytes)
}

/// Invoke the copy primitive, retrying remote transport failures
///
/// A remote copy that fails with a transport error reconnects and tries
/// again, up to [`MAX_TRANSFER_ATTEMPTS`] in total; running out of attempts
/// yields [`SyncError::CopyFailure`]. Local copies and non-transport errors
/// are not retried.
pub fn copy_with_retry(
    target: &mut dyn FileSystem,
    source: &Path,
    directory: &str,
    name: &str,
) -> Result<u64, SyncError> {
    let mut attempts = 0;
    loop {
        attempts += 1;
        let error = match target.copy_in(source, directory, name) {
            Ok(bytes) => return Ok(bytes),
            Err(e) => e,
        };

        let retryable = target.locality() == Locality::Remote && error.is_retryable_transfer();
        if !retryable {
            return Err(error);
        }
        if attempts >= MAX_TRANSFER_ATTEMPTS {
            warn!("Giving up on {} after {} attempts: {}", name, attempts, error);
            return Err(SyncError::CopyFailure {
                path: join_path(directory, name, target.separator()),
                attempts,
            });
        }

        warn!(
            "Transfer of {} failed (attempt {}/{}): {}. Reconnecting.",
            name, attempts, MAX_TRANSFER_ATTEMPTS, error
        );
        if let Err(e) = target.reconnect() {
            warn!("Reconnect failed: {}", e);
        }
    }
}

fn emit_event(on_event: Option<&ExecutionCallback>, event: ExecutionEvent<'_>) {
    if let Some(callback) = on_event {
        callback(&event);
    }
}
