//! Duplicate listing for a single local tree

use crate::catalog::Catalog;
use crate::config::DupesConfig;
use crate::dedup::{self, find_duplicates, DuplicateGroup};
use crate::fs::LocalFileSystem;
use crate::reconcile::reconcile;
use crate::scanner::scan_tree;
use crate::types::{Locality, SyncError};
use std::path::MAIN_SEPARATOR_STR;
use tracing::info;

/// List duplicate groups under the configured root
///
/// With `rescan` the tree is reconciled and scanned first; otherwise the
/// catalog is reported as it stands.
pub fn run(config: &DupesConfig) -> Result<Vec<DuplicateGroup>, SyncError> {
    let catalog_path = config.catalog_path();
    let mut catalog = Catalog::open(&catalog_path)?;
    info!("Using catalog {}", catalog_path.display());

    let root = config.root.to_string_lossy().into_owned();
    let groups = collect(config, &mut catalog, &root)?;

    for line in dedup::report_lines(&root, &groups, MAIN_SEPARATOR_STR) {
        println!("{}", line);
    }
    Ok(groups)
}

fn collect(
    config: &DupesConfig,
    catalog: &mut Catalog,
    root: &str,
) -> Result<Vec<DuplicateGroup>, SyncError> {
    if let Some(policy) = config.policy.as_ref().filter(|_| config.rescan) {
        let mut local = LocalFileSystem::new();
        reconcile(catalog, &mut [&mut local])?;
        let summary = scan_tree(&mut local, catalog, root, policy, None)?;
        for line in summary.report_lines() {
            println!("{}", line);
        }
    }
    find_duplicates(catalog, root, Locality::Local)
}
