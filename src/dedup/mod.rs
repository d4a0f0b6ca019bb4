//! Duplicate Detector
//!
//! Advisory only: reports files sharing a fingerprint within one tree and
//! never removes anything.

use crate::catalog::Catalog;
use crate::types::{FileRecord, Locality, SyncError};
use crate::ui::format_report_line;
use indicatif::HumanBytes;

/// Records under one tree root that share a fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub fingerprint: String,
    /// Ordered by directory then name
    pub members: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Bytes that would be freed by keeping a single copy
    pub fn redundant_bytes(&self) -> u64 {
        self.members.iter().skip(1).map(|m| m.size).sum()
    }
}

/// Every group of two or more records with the same fingerprint under `tree_root`
///
/// Groups are ordered by fingerprint. Records from other tree roots are
/// never included, even when their content matches.
pub fn find_duplicates(
    catalog: &Catalog,
    tree_root: &str,
    locality: Locality,
) -> Result<Vec<DuplicateGroup>, SyncError> {
    let mut groups = Vec::new();
    for (fingerprint, _count) in catalog.duplicate_fingerprints(tree_root, locality)? {
        let members = catalog.records_with_fingerprint(tree_root, locality, &fingerprint)?;
        groups.push(DuplicateGroup {
            fingerprint,
            members,
        });
    }
    Ok(groups)
}

/// Human-readable listing of duplicate groups
pub fn report_lines(tree_root: &str, groups: &[DuplicateGroup], separator: &str) -> Vec<String> {
    let mut lines = vec![format!("Duplicates in {}", tree_root)];
    if groups.is_empty() {
        lines.push("    No duplicate files".to_string());
        return lines;
    }

    for group in groups {
        lines.push(format!("    {} ({} files)", group.fingerprint, group.members.len()));
        for member in &group.members {
            lines.push(format!(
                "        {}  {}  {}",
                member.modified_at,
                HumanBytes(member.size),
                member.full_path(separator)
            ));
        }
    }

    let files: usize = groups.iter().map(|g| g.members.len()).sum();
    let redundant: u64 = groups.iter().map(DuplicateGroup::redundant_bytes).sum();
    lines.push(format_report_line(4, "Duplicate groups", groups.len()));
    lines.push(format_report_line(4, "Files in groups", files));
    lines.push(format_report_line(4, "Redundant bytes", HumanBytes(redundant)));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;
    use std::time::UNIX_EPOCH;

    fn record(root: &str, name: &str, fingerprint: &str) -> FileRecord {
        FileRecord {
            directory: root.to_string(),
            name: name.to_string(),
            fingerprint: fingerprint.to_string(),
            modified_at: Timestamp::from_system_time(UNIX_EPOCH),
            size: 100,
            tree_root: root.to_string(),
            relative_path: ".".to_string(),
            locality: Locality::Local,
        }
    }

    #[test]
    fn test_three_identical_files_form_one_group() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        for name in ["c.jpg", "a.jpg", "b.jpg"] {
            catalog.upsert(&record("/src", name, "H")).unwrap();
        }
        catalog.upsert(&record("/src", "unique.jpg", "U")).unwrap();

        let groups = find_duplicates(&catalog, "/src", Locality::Local).unwrap();
        assert_eq!(groups.len(), 1);
        let names: Vec<_> = groups[0].members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
        assert_eq!(groups[0].redundant_bytes(), 200);
    }

    #[test]
    fn test_groups_never_cross_tree_roots() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        catalog.upsert(&record("/src", "a.jpg", "H")).unwrap();
        catalog.upsert(&record("/tgt", "a.jpg", "H")).unwrap();

        assert!(find_duplicates(&catalog, "/src", Locality::Local).unwrap().is_empty());
        assert!(find_duplicates(&catalog, "/tgt", Locality::Local).unwrap().is_empty());

        catalog.upsert(&record("/tgt", "b.jpg", "H")).unwrap();
        let groups = find_duplicates(&catalog, "/tgt", Locality::Local).unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].members.iter().all(|m| m.tree_root == "/tgt"));
    }

    #[test]
    fn test_groups_never_mix_localities_under_one_root() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        catalog.upsert(&record("/photos", "a.jpg", "H")).unwrap();
        let mut remote = record("/photos", "a.jpg", "H");
        remote.locality = Locality::Remote;
        catalog.upsert(&remote).unwrap();

        assert!(find_duplicates(&catalog, "/photos", Locality::Local).unwrap().is_empty());
        assert!(find_duplicates(&catalog, "/photos", Locality::Remote).unwrap().is_empty());
    }

    #[test]
    fn test_report_lines() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        catalog.upsert(&record("/src", "a.jpg", "H")).unwrap();
        catalog.upsert(&record("/src", "b.jpg", "H")).unwrap();

        let groups = find_duplicates(&catalog, "/src", Locality::Local).unwrap();
        let report = report_lines("/src", &groups, "/").join("\n");
        assert!(report.contains("/src/a.jpg"));
        assert!(report.contains("/src/b.jpg"));
        assert!(report.contains("Duplicate groups"));

        assert!(report_lines("/src", &[], "/")[1].contains("No duplicate files"));
    }
}
