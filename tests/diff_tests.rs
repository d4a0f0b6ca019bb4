//! Planner decisions driven purely by catalog state.

use syncat::catalog::Catalog;
use syncat::dedup::find_duplicates;
use syncat::diff::{generate_sync_plan, TargetTree};
use syncat::types::{FileRecord, Locality, SyncDecision, Timestamp};

const LOCAL_TARGET: TargetTree<'static> = TargetTree {
    root: "/tgt",
    locality: Locality::Local,
    separator: "/",
};

fn record(root: &str, name: &str, fingerprint: &str, mtime: &str, locality: Locality) -> FileRecord {
    FileRecord {
        directory: root.to_string(),
        name: name.to_string(),
        fingerprint: fingerprint.to_string(),
        modified_at: Timestamp::parse(mtime).expect("valid timestamp"),
        size: 100,
        tree_root: root.to_string(),
        relative_path: ".".to_string(),
        locality,
    }
}

fn plan_single(source: FileRecord, target: Option<FileRecord>) -> SyncDecision {
    let mut catalog = Catalog::open_in_memory().expect("open catalog");
    catalog.upsert(&source).expect("insert source");
    if let Some(target) = target {
        catalog.upsert(&target).expect("insert target");
    }

    let plan = generate_sync_plan(&catalog, "/src", LOCAL_TARGET).expect("generate plan");
    assert_eq!(plan.entries.len(), 1);
    plan.entries[0].decision
}

#[test]
fn test_missing_target_is_copied() {
    let decision = plan_single(
        record("/src", "a.txt", "h1", "2024-01-01-10.00.00", Locality::Local),
        None,
    );
    assert_eq!(decision, SyncDecision::Copy);
}

#[test]
fn test_identical_content_is_kept_whatever_the_times() {
    let decision = plan_single(
        record("/src", "a.txt", "h1", "2024-01-01-10.00.00", Locality::Local),
        Some(record("/tgt", "a.txt", "h1", "2024-06-01-10.00.00", Locality::Local)),
    );
    assert_eq!(decision, SyncDecision::Keep);
    assert!(!decision.requires_copy());
}

#[test]
fn test_newer_source_replaces_target() {
    let decision = plan_single(
        record("/src", "a.txt", "h2", "2024-06-01-10.00.00", Locality::Local),
        Some(record("/tgt", "a.txt", "h1", "2024-01-01-10.00.00", Locality::Local)),
    );
    assert_eq!(decision, SyncDecision::Newer);
    assert!(decision.requires_copy());
}

#[test]
fn test_newer_target_is_protected() {
    let decision = plan_single(
        record("/src", "a.txt", "h2", "2024-01-01-10.00.00", Locality::Local),
        Some(record("/tgt", "a.txt", "h1", "2024-06-01-10.00.00", Locality::Local)),
    );
    assert_eq!(decision, SyncDecision::Older);
    assert!(!decision.requires_copy());
}

#[test]
fn test_equal_times_with_different_content_are_protected() {
    let decision = plan_single(
        record("/src", "a.txt", "h2", "2024-01-01-10.00.00", Locality::Local),
        Some(record("/tgt", "a.txt", "h1", "2024-01-01-10.00.00", Locality::Local)),
    );
    assert_eq!(decision, SyncDecision::Older);
}

#[test]
fn test_target_records_of_other_locality_are_ignored() {
    let decision = plan_single(
        record("/src", "a.txt", "h1", "2024-01-01-10.00.00", Locality::Local),
        Some(record("/tgt", "a.txt", "h1", "2024-01-01-10.00.00", Locality::Remote)),
    );
    assert_eq!(decision, SyncDecision::Copy);
}

#[test]
fn test_plan_resolves_nested_target_directories() {
    let mut catalog = Catalog::open_in_memory().expect("open catalog");
    let mut nested = record("/src", "b.txt", "h1", "2024-01-01-10.00.00", Locality::Local);
    nested.directory = "/src/2024/june".to_string();
    nested.relative_path = "2024/june".to_string();
    catalog.upsert(&nested).expect("insert");

    let remote = TargetTree {
        root: "D:\\backup",
        locality: Locality::Remote,
        separator: "\\",
    };
    let plan = generate_sync_plan(&catalog, "/src", remote).expect("generate plan");

    assert_eq!(plan.entries[0].target_directory, "D:\\backup\\2024\\june");
    assert_eq!(plan.stats.transfer_files, 1);
    assert_eq!(plan.stats.transfer_bytes, 100);
}

#[test]
fn test_duplicates_group_within_one_root_only() {
    let mut catalog = Catalog::open_in_memory().expect("open catalog");
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        catalog
            .upsert(&record("/src", name, "same", "2024-01-01-10.00.00", Locality::Local))
            .expect("insert source");
    }
    catalog
        .upsert(&record("/src", "d.jpg", "unique", "2024-01-01-10.00.00", Locality::Local))
        .expect("insert unique");
    catalog
        .upsert(&record("/tgt", "a.jpg", "same", "2024-01-01-10.00.00", Locality::Local))
        .expect("insert target copy");

    let groups = find_duplicates(&catalog, "/src", Locality::Local).expect("find duplicates");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].fingerprint, "same");
    let names: Vec<&str> = groups[0].members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    assert!(groups[0].members.iter().all(|m| m.tree_root == "/src"));
    assert_eq!(groups[0].redundant_bytes(), 200);

    assert!(find_duplicates(&catalog, "/tgt", Locality::Local).expect("target").is_empty());
}
