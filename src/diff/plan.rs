//! Plan generation from catalog state

use crate::catalog::Catalog;
use crate::diff::{compare_records, DiffPlan, PlannedFile};
use crate::types::{resolve_relative, Locality, SyncError};

/// Where the target tree lives and how its paths are joined
#[derive(Debug, Clone, Copy)]
pub struct TargetTree<'a> {
    pub root: &'a str,
    pub locality: Locality,
    pub separator: &'a str,
}

/// Decide, for every local source record, whether it must be copied
///
/// Reads the catalog only, so a simulated run and a real run starting from
/// the same catalog state produce the same plan.
///
/// # Example
/// ```
/// use syncat::catalog::Catalog;
/// use syncat::diff::{generate_sync_plan, TargetTree};
/// use syncat::types::{FileRecord, Locality, Timestamp};
///
/// let mut catalog = Catalog::open_in_memory()?;
/// catalog.upsert(&FileRecord {
///     directory: "/src".to_string(),
///     name: "a.txt".to_string(),
///     fingerprint: "h1".to_string(),
///     modified_at: Timestamp::parse("2024-01-01-00.00.00").unwrap(),
///     size: 4,
///     tree_root: "/src".to_string(),
///     relative_path: ".".to_string(),
///     locality: Locality::Local,
/// })?;
///
/// let target = TargetTree { root: "/tgt", locality: Locality::Local, separator: "/" };
/// let plan = generate_sync_plan(&catalog, "/src", target)?;
/// assert_eq!(plan.stats.copy, 1);
/// assert_eq!(plan.entries[0].target_directory, "/tgt");
/// # Ok::<(), syncat::types::SyncError>(())
/// ```
pub fn generate_sync_plan(
    catalog: &Catalog,
    source_root: &str,
    target: TargetTree<'_>,
) -> Result<DiffPlan, SyncError> {
    let mut plan = DiffPlan::new(target.root);

    for source in catalog.records_in_tree(source_root, Locality::Local)? {
        let existing = catalog.lookup(
            target.root,
            &source.relative_path,
            &source.name,
            target.locality,
        )?;
        let decision = compare_records(&source, existing.as_ref());
        let target_directory =
            resolve_relative(target.root, &source.relative_path, target.separator);

        plan.add(PlannedFile {
            source,
            decision,
            target_directory,
        });
    }

    Ok(plan)
}
