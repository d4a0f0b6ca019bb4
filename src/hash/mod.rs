//! Fingerprint Engine
//!
//! A fingerprint is the lowercase hex blake3 digest of a file's full content.
//! Remote files are fingerprinted by the agent on their own host with the
//! same functions, so both sides always agree.

use crate::types::SyncError;
use std::path::Path;

/// Fingerprint of an in-memory buffer
pub fn fingerprint_bytes(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Fingerprint of the file at `file_path`
///
/// The whole file is read into memory first. A missing or unreadable file is
/// an [`SyncError::Io`], never an empty fingerprint.
///
/// # Example
/// ```no_run
/// use syncat::hash::fingerprint_file;
/// use std::path::Path;
///
/// let hex = fingerprint_file(Path::new("photo.jpg"))?;
/// assert_eq!(hex.len(), 64);
/// # Ok::<(), syncat::types::SyncError>(())
/// ```
pub fn fingerprint_file(file_path: &Path) -> Result<String, SyncError> {
    let data = std::fs::read(file_path)?;
    Ok(fingerprint_bytes(&data))
}
