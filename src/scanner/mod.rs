//! Directory Scanner
//!
//! Lists a tree through its [`FileSystem`], fingerprints every accepted file
//! where it lives, and upserts the result into the catalog.

mod policy;
mod summary;
mod walker;

pub use policy::{extension_of, ExtensionClass, ExtensionPolicy};
pub use summary::{ExtensionTally, ScanSummary};
pub use walker::{relative_dir, walk_tree, ScanListing, ScannedFile};

use crate::catalog::{Catalog, UpsertOutcome};
use crate::fs::FileSystem;
use crate::types::{FileRecord, SyncError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Called after each recorded file with running (files, bytes) totals
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Scan one tree root into the catalog
///
/// A file that cannot be fingerprinted is counted in
/// [`ScanSummary::failed`] and skipped. Connection and catalog failures abort
/// the scan, since every later file would fail the same way.
pub fn scan_tree(
    fs: &mut dyn FileSystem,
    catalog: &mut Catalog,
    root: &str,
    policy: &ExtensionPolicy,
    on_progress: Option<&ProgressCallback>,
) -> Result<ScanSummary, SyncError> {
    let started = Instant::now();
    let locality = fs.locality();
    info!("Scanning {} tree {}", locality, root);

    let listing = fs.list(root, policy)?;
    let mut summary = ScanSummary::new(root, policy);
    summary.tally = listing.tally;

    for file in listing.files {
        let fingerprint = match fs.fingerprint(&file.directory, &file.name) {
            Ok(fingerprint) => fingerprint,
            Err(e) if e.is_connection_error() => return Err(e),
            Err(e) => {
                warn!(
                    "Cannot fingerprint {}: {}. File will be skipped.",
                    crate::types::join_path(&file.directory, &file.name, fs.separator()),
                    e
                );
                summary.failed += 1;
                continue;
            }
        };

        let record = FileRecord {
            directory: file.directory,
            name: file.name,
            fingerprint,
            modified_at: file.modified_at,
            size: file.size,
            tree_root: root.to_string(),
            relative_path: file.relative_path,
            locality,
        };

        match catalog.upsert(&record)? {
            UpsertOutcome::Inserted => {
                debug!("New file {}/{}", record.directory, record.name);
                summary.inserted += 1;
            }
            UpsertOutcome::Updated => {
                debug!("Changed file {}/{}", record.directory, record.name);
                summary.updated += 1;
            }
            UpsertOutcome::Unchanged => summary.unchanged += 1,
        }
        summary.bytes += record.size;

        if let Some(callback) = on_progress {
            callback(summary.recorded() as u64, summary.bytes);
        }
    }

    summary.duration = started.elapsed();
    info!(
        "Scanned {}: {} files recorded in {:.2?}",
        root,
        summary.recorded(),
        summary.duration
    );
    Ok(summary)
}
