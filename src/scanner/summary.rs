//! Per-tree scan statistics (observability only)

use super::policy::{ExtensionClass, ExtensionPolicy};
use crate::ui::format_report_line;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

const NO_EXTENSION_LABEL: &str = "(none)";

/// File counts per extension class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionTally {
    /// Accepted extensions in policy order
    pub accepted: Vec<(String, usize)>,
    /// Rejected extensions in policy order
    pub rejected: Vec<(String, usize)>,
    /// Extensions matching neither list
    pub others: BTreeMap<String, usize>,
}

impl ExtensionTally {
    pub fn new(policy: &ExtensionPolicy) -> Self {
        Self {
            accepted: policy.accepted().iter().map(|e| (e.clone(), 0)).collect(),
            rejected: policy.rejected().iter().map(|e| (e.clone(), 0)).collect(),
            others: BTreeMap::new(),
        }
    }

    /// Count one file; returns true the first time an unexpected extension is seen
    pub fn record(&mut self, class: ExtensionClass, extension: &str) -> bool {
        let bucket = match class {
            ExtensionClass::Accepted => &mut self.accepted,
            ExtensionClass::Rejected => &mut self.rejected,
            ExtensionClass::Other => {
                let count = self.others.entry(extension.to_string()).or_insert(0);
                *count += 1;
                return *count == 1;
            }
        };
        match bucket.iter_mut().find(|(ext, _)| ext == extension) {
            Some((_, count)) => *count += 1,
            None => bucket.push((extension.to_string(), 1)),
        }
        false
    }

    pub fn accepted_total(&self) -> usize {
        self.accepted.iter().map(|(_, n)| n).sum()
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.iter().map(|(_, n)| n).sum()
    }

    pub fn others_total(&self) -> usize {
        self.others.values().sum()
    }
}

/// Outcome of scanning one tree into the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub root: String,
    pub tally: ExtensionTally,
    /// Records created for files seen for the first time
    pub inserted: usize,
    /// Records whose fingerprint, time or size changed
    pub updated: usize,
    pub unchanged: usize,
    /// Accepted files that could not be fingerprinted
    pub failed: usize,
    pub bytes: u64,
    pub duration: Duration,
}

impl ScanSummary {
    pub fn new(root: &str, policy: &ExtensionPolicy) -> Self {
        Self {
            root: root.to_string(),
            tally: ExtensionTally::new(policy),
            ..Default::default()
        }
    }

    /// Files written to or confirmed in the catalog
    pub fn recorded(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }

    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Statistics for {}", self.root)];
        lines.push("    Accepted file types:".to_string());
        for (ext, count) in &self.tally.accepted {
            lines.push(format_report_line(8, ext, count));
        }
        lines.push("    Rejected file types:".to_string());
        for (ext, count) in &self.tally.rejected {
            lines.push(format_report_line(8, ext, count));
        }
        if !self.tally.others.is_empty() {
            lines.push("    Unexpected file types:".to_string());
            for (ext, count) in &self.tally.others {
                let label = if ext.is_empty() { NO_EXTENSION_LABEL } else { ext };
                lines.push(format_report_line(8, label, count));
            }
        }
        lines.push(format_report_line(4, "New files", self.inserted));
        lines.push(format_report_line(4, "Changed files", self.updated));
        lines.push(format_report_line(4, "Unchanged files", self.unchanged));
        if self.failed > 0 {
            lines.push(format_report_line(4, "Unreadable files", self.failed));
        }
        lines
    }
}
