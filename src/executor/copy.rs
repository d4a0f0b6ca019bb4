//! Atomic local file copy

use crate::types::SyncError;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const COPY_BUFFER_SIZE: usize = 128 * 1024;

/// Copy a file atomically using write-then-rename
///
/// 1. Write to `<dest>.part` next to the destination
/// 2. Flush and sync to disk
/// 3. Carry over permissions and modification time
/// 4. Rename over the destination
///
/// A failed copy leaves the destination untouched.
///
/// # Example
/// ```no_run
/// use syncat::executor::copy_file_atomic;
/// use std::path::Path;
///
/// let bytes = copy_file_atomic(Path::new("source.txt"), Path::new("dest.txt"))?;
/// # Ok::<(), syncat::types::SyncError>(())
/// ```
pub fn copy_file_atomic(src: &Path, dest: &Path) -> Result<u64, SyncError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(SyncError::Io)?;
    }

    let part_path = part_path_for(dest);
    let result = write_part(src, &part_path).and_then(|bytes| {
        fs::rename(&part_path, dest).map_err(SyncError::Io)?;
        Ok(bytes)
    });

    if result.is_err() {
        let _ = fs::remove_file(&part_path);
    }
    result
}

fn write_part(src: &Path, part_path: &Path) -> Result<u64, SyncError> {
    let mut src_file = File::open(src).map_err(SyncError::Io)?;
    let mut part_file = File::create(part_path).map_err(SyncError::Io)?;

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total_bytes = 0u64;
    loop {
        let bytes_read = src_file.read(&mut buffer).map_err(SyncError::Io)?;
        if bytes_read == 0 {
            break;
        }
        part_file
            .write_all(&buffer[..bytes_read])
            .map_err(SyncError::Io)?;
        total_bytes += bytes_read as u64;
    }

    part_file.sync_all().map_err(SyncError::Io)?;
    // Windows refuses to rename an open file
    drop(part_file);

    let src_metadata = fs::metadata(src).map_err(SyncError::Io)?;
    fs::set_permissions(part_path, src_metadata.permissions()).map_err(SyncError::Io)?;
    let mtime = src_metadata.modified().map_err(SyncError::Io)?;
    filetime::set_file_mtime(part_path, filetime::FileTime::from_system_time(mtime))
        .map_err(SyncError::Io)?;

    Ok(total_bytes)
}

/// `name.ext` becomes `name.ext.part`, so `a.jpg` and `a.png` never collide
fn part_path_for(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("unnamed"));
    name.push(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use tempfile::TempDir;

    #[test]
    fn test_copy_preserves_content_and_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src.bin");
        fs::write(&src, b"hello world").unwrap();
        let pinned = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&src, pinned).unwrap();

        let dest = temp_dir.path().join("out/dest.bin");
        let bytes = copy_file_atomic(&src, &dest).unwrap();

        assert_eq!(bytes, 11);
        assert_eq!(fs::read(&dest).unwrap(), b"hello world");
        let copied = FileTime::from_last_modification_time(&fs::metadata(&dest).unwrap());
        assert_eq!(copied.unix_seconds(), pinned.unix_seconds());
        assert!(!temp_dir.path().join("out/dest.bin.part").exists());
    }

    #[test]
    fn test_copy_overwrites_existing_destination() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("a.txt");
        let dest = temp_dir.path().join("b.txt");
        fs::write(&src, b"new").unwrap();
        fs::write(&dest, b"old content").unwrap();

        copy_file_atomic(&src, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn test_missing_source_leaves_no_part_file() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("dest.txt");

        let result = copy_file_atomic(&temp_dir.path().join("missing.txt"), &dest);
        assert!(matches!(result, Err(SyncError::Io(_))));
        assert!(!dest.exists());
        assert!(!temp_dir.path().join("dest.txt.part").exists());
    }

    #[test]
    fn test_part_path_keeps_extension() {
        assert_eq!(
            part_path_for(Path::new("/t/a.jpg")),
            PathBuf::from("/t/a.jpg.part")
        );
    }
}
