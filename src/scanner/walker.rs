//! Local directory walker

use super::policy::{ExtensionClass, ExtensionPolicy};
use super::summary::ExtensionTally;
use crate::types::{SyncError, Timestamp, ROOT_RELATIVE_PATH};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};
use tracing::{info, warn};

/// An accepted file discovered under a tree root
///
/// Also the element type of the agent's scan reply, hence the short wire names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedFile {
    #[serde(rename = "dir")]
    pub directory: String,
    pub name: String,
    /// `/`-separated directory relative to the root, `"."` at the root
    #[serde(rename = "rel_path")]
    pub relative_path: String,
    pub size: u64,
    #[serde(rename = "mtime")]
    pub modified_at: Timestamp,
}

/// Accepted files plus extension statistics for one walk
///
/// Serialized as-is for the agent's scan reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanListing {
    pub files: Vec<ScannedFile>,
    pub tally: ExtensionTally,
}

/// Walk a local tree and list the files the policy accepts
///
/// Symbolic links are never followed, so link cycles cannot trap the walk.
/// Traversal order is whatever the filesystem yields. Entries that vanish or
/// cannot be read mid-walk are logged and skipped; a missing root is an error.
pub fn walk_tree(root_path: &Path, policy: &ExtensionPolicy) -> Result<ScanListing, SyncError> {
    if !root_path.is_dir() {
        return Err(SyncError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("not a directory: {}", root_path.display()),
        )));
    }

    let mut listing = ScanListing {
        files: Vec::new(),
        tally: ExtensionTally::new(policy),
    };

    // Every file counts, hidden or ignored ones included.
    let walker = ignore::WalkBuilder::new(root_path)
        .standard_filters(false)
        .follow_links(false)
        .build();

    for result in walker {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error during directory traversal: {}. Scan continues.", e);
                continue;
            }
        };

        let Some(file_type) = entry.file_type() else {
            continue;
        };
        if !file_type.is_file() {
            continue;
        }

        let path = entry.path();
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let (class, extension) = policy.classify(&name);
        if listing.tally.record(class, &extension) {
            info!("Unexpected file type: {}", path.display());
        }
        if class != ExtensionClass::Accepted {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                warn!(
                    "Failed to read metadata for {}: {}. File will be skipped.",
                    path.display(),
                    e
                );
                continue;
            }
        };
        let mtime = match metadata.modified() {
            Ok(t) => t,
            Err(e) => {
                warn!("No modification time for {}: {}", path.display(), e);
                continue;
            }
        };

        let directory = path.parent().unwrap_or(root_path);
        let Some(relative_path) = relative_dir(root_path, directory) else {
            warn!(
                "Failed to calculate relative path for {}. File will be skipped.",
                path.display()
            );
            continue;
        };

        listing.files.push(ScannedFile {
            directory: directory.to_string_lossy().into_owned(),
            name,
            relative_path,
            size: metadata.len(),
            modified_at: Timestamp::from_system_time(mtime),
        });
    }

    Ok(listing)
}

/// `/`-joined path of `directory` below `root`, `"."` for the root itself
pub fn relative_dir(root: &Path, directory: &Path) -> Option<String> {
    let relative = directory.strip_prefix(root).ok()?;
    let segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if segments.is_empty() {
        Some(ROOT_RELATIVE_PATH.to_string())
    } else {
        Some(segments.join("/"))
    }
}
