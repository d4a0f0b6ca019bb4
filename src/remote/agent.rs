//! Request handling for the `syncat-agent` companion program

use super::protocol::{encode_scan, part_path, AgentCommand};
use crate::hash::fingerprint_file;
use crate::scanner::{walk_tree, ExtensionPolicy};
use crate::types::SyncError;
use std::path::{Path, MAIN_SEPARATOR};

/// Permission bits for directories created on request
pub const CREATED_DIR_MODE: u32 = 0o755;

/// Answer one request against this host's filesystem
///
/// The reply is what the agent prints to stdout, without a trailing newline.
pub fn handle(command: &AgentCommand) -> Result<String, SyncError> {
    match command {
        AgentCommand::Scan {
            root,
            accept,
            reject,
        } => {
            let policy = ExtensionPolicy::from_comma_lists(accept, reject);
            let listing = walk_tree(Path::new(root), &policy)?;
            encode_scan(&listing)
        }
        AgentCommand::Hash { dir, file } => fingerprint_file(&Path::new(dir).join(file)),
        AgentCommand::Probe { path, create } => {
            let path = Path::new(path);
            if *create && !path.exists() {
                create_dir(path)?;
            }
            Ok(path.exists().to_string())
        }
        AgentCommand::Sep => Ok(MAIN_SEPARATOR.to_string()),
        AgentCommand::Commit { path } => {
            std::fs::rename(part_path(path), path).map_err(SyncError::Io)?;
            Ok(true.to_string())
        }
        AgentCommand::Discard { path } => match std::fs::remove_file(part_path(path)) {
            Ok(()) => Ok(true.to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false.to_string()),
            Err(e) => Err(SyncError::Io(e)),
        },
    }
}

#[cfg(unix)]
fn create_dir(path: &Path) -> Result<(), SyncError> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(CREATED_DIR_MODE)
        .create(path)
        .map_err(SyncError::Io)
}

#[cfg(not(unix))]
fn create_dir(path: &Path) -> Result<(), SyncError> {
    std::fs::create_dir_all(path).map_err(SyncError::Io)
}
