//! Uniform view of local and remote trees
//!
//! The reconciler, scanner and executor are written once against
//! [`FileSystem`]; each record's [`Locality`] picks the implementation.

mod local;
mod remote;

pub use local::LocalFileSystem;
pub use remote::RemoteFileSystem;

use crate::scanner::{ExtensionPolicy, ScanListing};
use crate::types::{Locality, SyncError};
use std::path::Path;

/// Capabilities shared by local and remote trees
pub trait FileSystem {
    /// Which catalog partition this filesystem owns
    fn locality(&self) -> Locality;

    /// Separator used to join paths on this host
    fn separator(&self) -> &str;

    /// Whether `directory/name` currently exists
    fn file_exists(&mut self, directory: &str, name: &str) -> Result<bool, SyncError>;

    /// Create `path` and its parents if missing
    fn ensure_dir(&mut self, path: &str) -> Result<(), SyncError>;

    /// List files under `root` that the policy accepts
    fn list(&mut self, root: &str, policy: &ExtensionPolicy) -> Result<ScanListing, SyncError>;

    /// Content fingerprint of `directory/name`, computed where the file lives
    fn fingerprint(&mut self, directory: &str, name: &str) -> Result<String, SyncError>;

    /// Copy a local source file to `directory/name`, preserving its modification time
    ///
    /// Returns the number of bytes written.
    fn copy_in(&mut self, source: &Path, directory: &str, name: &str) -> Result<u64, SyncError>;

    /// Replace the underlying connection, if there is one
    fn reconnect(&mut self) -> Result<(), SyncError> {
        Ok(())
    }
}
