//! Staleness Reconciler
//!
//! Drops catalog records whose backing file is gone. Runs before any scan,
//! so scans only ever add or update records.

use crate::catalog::Catalog;
use crate::fs::FileSystem;
use crate::types::SyncError;
use tracing::{debug, info, warn};

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Records whose file was confirmed present
    pub found: usize,
    /// Records deleted because their file is gone
    pub missing: usize,
    /// Records left untouched because no filesystem for their locality was given
    pub unverified: usize,
    /// Records kept because their file could not be checked
    pub failed: usize,
}

/// Confirm every catalog record against the filesystem owning its locality
///
/// Local records are checked directly, remote ones through the bridge.
/// Connection and catalog failures abort the pass; records already deleted
/// stay deleted. Any other failure to check one file keeps its record and is
/// counted in `failed`.
pub fn reconcile(
    catalog: &mut Catalog,
    filesystems: &mut [&mut dyn FileSystem],
) -> Result<ReconcileStats, SyncError> {
    let mut stats = ReconcileStats::default();

    for record in catalog.all_records()? {
        let Some(fs) = filesystems
            .iter_mut()
            .find(|fs| fs.locality() == record.locality)
        else {
            stats.unverified += 1;
            continue;
        };

        let exists = match fs.file_exists(&record.directory, &record.name) {
            Ok(exists) => exists,
            Err(e @ (SyncError::Connection(_) | SyncError::Catalog(_))) => return Err(e),
            Err(e) => {
                warn!(
                    "Could not check {}: {}",
                    record.full_path(fs.separator()),
                    e
                );
                stats.failed += 1;
                continue;
            }
        };

        if exists {
            stats.found += 1;
        } else {
            debug!(
                "Stale {} record {}",
                record.locality,
                record.full_path(fs.separator())
            );
            catalog.delete(&record.directory, &record.name, record.locality)?;
            stats.missing += 1;
        }
    }

    info!(
        "Reconciled catalog: {} present, {} removed, {} unverified, {} failed",
        stats.found, stats.missing, stats.unverified, stats.failed
    );
    Ok(stats)
}
