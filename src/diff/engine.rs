//! Diff plan types

use crate::types::{FileRecord, SyncDecision};

/// One source file and what the planner decided for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub source: FileRecord,
    pub decision: SyncDecision,
    /// Directory on the target that corresponds to the source's relative path
    pub target_directory: String,
}

/// Decisions for every source record, in (directory, name) order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffPlan {
    /// Root of the tree receiving copies
    pub target_root: String,
    pub entries: Vec<PlannedFile>,
    pub stats: PlanStats,
}

impl DiffPlan {
    pub fn new(target_root: impl Into<String>) -> Self {
        Self {
            target_root: target_root.into(),
            ..Default::default()
        }
    }

    /// Add an entry and update statistics
    pub fn add(&mut self, entry: PlannedFile) {
        let stats = &mut self.stats;
        if entry.decision.was_compared() {
            stats.compared += 1;
        }
        match entry.decision {
            SyncDecision::Copy => stats.copy += 1,
            SyncDecision::Keep => stats.kept += 1,
            SyncDecision::Newer => stats.newer += 1,
            SyncDecision::Older => stats.older += 1,
        }
        if entry.decision.requires_copy() {
            stats.transfer_files += 1;
            stats.transfer_bytes += entry.source.size;
        }
        self.entries.push(entry);
    }

    /// Entries that invoke the copy primitive
    pub fn transfers(&self) -> impl Iterator<Item = &PlannedFile> {
        self.entries.iter().filter(|e| e.decision.requires_copy())
    }

    pub fn has_transfers(&self) -> bool {
        self.stats.transfer_files > 0
    }
}

/// Counts of planned decisions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanStats {
    /// Source files with no target record
    pub copy: usize,
    /// Source files that had a target record to compare against
    pub compared: usize,
    pub kept: usize,
    pub newer: usize,
    pub older: usize,
    /// Files the copy primitive will be invoked for (copy + newer)
    pub transfer_files: usize,
    pub transfer_bytes: u64,
}
