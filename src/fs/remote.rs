//! Remote filesystem implementation backed by the execution bridge

use super::FileSystem;
use crate::remote::{Channel, RemoteBridge};
use crate::scanner::{ExtensionPolicy, ScanListing};
use crate::types::{join_path, Locality, SyncError};
use std::path::Path;

/// Files reachable only through a [`RemoteBridge`]
pub struct RemoteFileSystem<C: Channel> {
    bridge: RemoteBridge<C>,
}

impl<C: Channel> RemoteFileSystem<C> {
    pub fn new(bridge: RemoteBridge<C>) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &RemoteBridge<C> {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut RemoteBridge<C> {
        &mut self.bridge
    }
}

impl<C: Channel> FileSystem for RemoteFileSystem<C> {
    fn locality(&self) -> Locality {
        Locality::Remote
    }

    fn separator(&self) -> &str {
        self.bridge.separator()
    }

    fn file_exists(&mut self, directory: &str, name: &str) -> Result<bool, SyncError> {
        let path = join_path(directory, name, self.bridge.separator());
        self.bridge.probe(&path)
    }

    fn ensure_dir(&mut self, path: &str) -> Result<(), SyncError> {
        self.bridge.ensure_dir(path)
    }

    fn list(&mut self, root: &str, policy: &ExtensionPolicy) -> Result<ScanListing, SyncError> {
        self.bridge.scan(root, policy)
    }

    fn fingerprint(&mut self, directory: &str, name: &str) -> Result<String, SyncError> {
        self.bridge.fingerprint(directory, name)
    }

    fn copy_in(&mut self, source: &Path, directory: &str, name: &str) -> Result<u64, SyncError> {
        let size = std::fs::metadata(source).map_err(SyncError::Io)?.len();
        self.bridge.ensure_dir(directory)?;
        self.bridge.upload(source, directory, name)?;
        Ok(size)
    }

    fn reconnect(&mut self) -> Result<(), SyncError> {
        self.bridge.reconnect()
    }
}
