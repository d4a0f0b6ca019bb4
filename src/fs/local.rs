//! Local filesystem implementation

use super::FileSystem;
use crate::executor::copy_file_atomic;
use crate::hash::fingerprint_file;
use crate::scanner::{walk_tree, ExtensionPolicy, ScanListing};
use crate::types::{Locality, SyncError};
use std::path::{Path, MAIN_SEPARATOR_STR};

/// Files reachable through the local filesystem API
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn locality(&self) -> Locality {
        Locality::Local
    }

    fn separator(&self) -> &str {
        MAIN_SEPARATOR_STR
    }

    fn file_exists(&mut self, directory: &str, name: &str) -> Result<bool, SyncError> {
        Ok(Path::new(directory).join(name).is_file())
    }

    fn ensure_dir(&mut self, path: &str) -> Result<(), SyncError> {
        std::fs::create_dir_all(path).map_err(SyncError::Io)
    }

    fn list(&mut self, root: &str, policy: &ExtensionPolicy) -> Result<ScanListing, SyncError> {
        walk_tree(Path::new(root), policy)
    }

    fn fingerprint(&mut self, directory: &str, name: &str) -> Result<String, SyncError> {
        fingerprint_file(&Path::new(directory).join(name))
    }

    fn copy_in(&mut self, source: &Path, directory: &str, name: &str) -> Result<u64, SyncError> {
        copy_file_atomic(source, &Path::new(directory).join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_file_exists_ignores_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_string_lossy().into_owned();
        fs::write(temp_dir.path().join("a.txt"), b"a").unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();

        let mut local = LocalFileSystem::new();
        assert!(local.file_exists(&root, "a.txt").unwrap());
        assert!(!local.file_exists(&root, "sub").unwrap());
        assert!(!local.file_exists(&root, "missing.txt").unwrap());
    }

    #[test]
    fn test_copy_in_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source.txt");
        fs::write(&source, b"payload").unwrap();
        let target_dir = temp_dir.path().join("x/y");

        let mut local = LocalFileSystem::new();
        let bytes = local
            .copy_in(&source, &target_dir.to_string_lossy(), "copy.txt")
            .unwrap();

        assert_eq!(bytes, 7);
        assert_eq!(fs::read(target_dir.join("copy.txt")).unwrap(), b"payload");
    }
}
