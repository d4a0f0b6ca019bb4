//! Persistent file inventory
//!
//! One SQLite file per sync pair records the last known fingerprint and
//! metadata of every file under both trees. Every write touches exactly one
//! row inside its own transaction, so an interrupted run leaves the catalog
//! consistent at single-file granularity.

mod schema;

use crate::types::{FileRecord, Locality, SyncError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use tracing::debug;

const RECORD_COLUMNS: &str =
    "dir_name, file_name, file_md5, file_mtime, file_size, root_dir, rel_path, local_rmt";

/// Result of writing one observed file into the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Handle on the catalog database
pub struct Catalog {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Catalog {
    /// Open (or create) the catalog at `path`
    pub fn open(path: &Path) -> Result<Self, SyncError> {
        let conn = Connection::open(path)?;
        schema::create(&conn)?;
        debug!(catalog = %path.display(), "catalog opened");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a throwaway catalog that lives only as long as the handle
    pub fn open_in_memory() -> Result<Self, SyncError> {
        let conn = Connection::open_in_memory()?;
        schema::create(&conn)?;
        Ok(Self { conn, path: None })
    }

    /// Location on disk, `None` for in-memory catalogs
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Stable catalog file name for a sync pair
    ///
    /// Repeated runs over the same source, target and host reuse one catalog
    /// without the user naming it.
    pub fn file_name_for(source: &str, target: &str, host: Option<&str>) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(source.as_bytes());
        hasher.update(target.as_bytes());
        if let Some(host) = host {
            hasher.update(host.as_bytes());
        }
        let hex = hasher.finalize().to_hex();
        format!("{}.db", &hex.as_str()[..32])
    }

    /// Insert a record, or update the stored one when content or metadata changed
    pub fn upsert(&mut self, record: &FileRecord) -> Result<UpsertOutcome, SyncError> {
        let tx = self.conn.transaction()?;

        let existing = tx
            .query_row(
                "SELECT file_md5, file_mtime, file_size FROM file
                  WHERE dir_name = ?1 AND file_name = ?2 AND local_rmt = ?3",
                params![record.directory, record.name, record.locality],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let outcome = match existing {
            None => {
                tx.execute(
                    "INSERT INTO file (dir_name, file_name, file_md5, file_mtime, file_size,
                                       root_dir, rel_path, local_rmt)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        record.directory,
                        record.name,
                        record.fingerprint,
                        record.modified_at,
                        record.size as i64,
                        record.tree_root,
                        record.relative_path,
                        record.locality,
                    ],
                )?;
                UpsertOutcome::Inserted
            }
            Some((fingerprint, modified_at, size))
                if fingerprint == record.fingerprint
                    && modified_at == record.modified_at.as_str()
                    && size == record.size as i64 =>
            {
                UpsertOutcome::Unchanged
            }
            Some(_) => {
                tx.execute(
                    "UPDATE file
                        SET file_md5 = ?1, file_mtime = ?2, file_size = ?3
                      WHERE dir_name = ?4 AND file_name = ?5 AND local_rmt = ?6",
                    params![
                        record.fingerprint,
                        record.modified_at,
                        record.size as i64,
                        record.directory,
                        record.name,
                        record.locality,
                    ],
                )?;
                UpsertOutcome::Updated
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    /// Current record for a relative path inside one tree
    pub fn lookup(
        &self,
        tree_root: &str,
        relative_path: &str,
        name: &str,
        locality: Locality,
    ) -> Result<Option<FileRecord>, SyncError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM file
              WHERE root_dir = ?1 AND rel_path = ?2 AND file_name = ?3 AND local_rmt = ?4"
        );
        let record = self
            .conn
            .query_row(
                &sql,
                params![tree_root, relative_path, name, locality],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Record stored under the uniqueness key
    pub fn get(
        &self,
        directory: &str,
        name: &str,
        locality: Locality,
    ) -> Result<Option<FileRecord>, SyncError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM file
              WHERE dir_name = ?1 AND file_name = ?2 AND local_rmt = ?3"
        );
        let record = self
            .conn
            .query_row(&sql, params![directory, name, locality], record_from_row)
            .optional()?;
        Ok(record)
    }

    /// Every record, ordered by directory then name
    pub fn all_records(&self) -> Result<Vec<FileRecord>, SyncError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM file ORDER BY dir_name, file_name, local_rmt");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Records discovered under one tree root, ordered by directory then name
    pub fn records_in_tree(
        &self,
        tree_root: &str,
        locality: Locality,
    ) -> Result<Vec<FileRecord>, SyncError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM file
              WHERE root_dir = ?1 AND local_rmt = ?2
              ORDER BY dir_name, file_name"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![tree_root, locality], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Remove exactly one record; returns whether a row was deleted
    pub fn delete(
        &mut self,
        directory: &str,
        name: &str,
        locality: Locality,
    ) -> Result<bool, SyncError> {
        let deleted = self.conn.execute(
            "DELETE FROM file WHERE dir_name = ?1 AND file_name = ?2 AND local_rmt = ?3",
            params![directory, name, locality],
        )?;
        Ok(deleted == 1)
    }

    /// Fingerprints occurring more than once in one tree, with their counts
    pub fn duplicate_fingerprints(
        &self,
        tree_root: &str,
        locality: Locality,
    ) -> Result<Vec<(String, usize)>, SyncError> {
        let mut stmt = self.conn.prepare(
            "SELECT file_md5, count(*) FROM file
              WHERE root_dir = ?1 AND local_rmt = ?2
              GROUP BY file_md5
             HAVING count(*) > 1
              ORDER BY file_md5",
        )?;
        let rows = stmt.query_map(params![tree_root, locality], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Records of one tree carrying `fingerprint`, ordered by directory then name
    pub fn records_with_fingerprint(
        &self,
        tree_root: &str,
        locality: Locality,
        fingerprint: &str,
    ) -> Result<Vec<FileRecord>, SyncError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM file
              WHERE root_dir = ?1 AND local_rmt = ?2 AND file_md5 = ?3
              ORDER BY dir_name, file_name"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![tree_root, locality, fingerprint], record_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Number of records in the catalog
    pub fn len(&self) -> Result<usize, SyncError> {
        let count: i64 = self
            .conn
            .query_row("SELECT count(*) FROM file", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, SyncError> {
        Ok(self.len()? == 0)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        directory: row.get(0)?,
        name: row.get(1)?,
        fingerprint: row.get(2)?,
        modified_at: row.get(3)?,
        size: row.get::<_, i64>(4)? as u64,
        tree_root: row.get(5)?,
        relative_path: row.get(6)?,
        locality: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Timestamp;
    use std::time::{Duration, UNIX_EPOCH};

    fn record(directory: &str, name: &str, fingerprint: &str, mtime_secs: u64) -> FileRecord {
        FileRecord {
            directory: directory.to_string(),
            name: name.to_string(),
            fingerprint: fingerprint.to_string(),
            modified_at: Timestamp::from_system_time(UNIX_EPOCH + Duration::from_secs(mtime_secs)),
            size: 10,
            tree_root: "/src".to_string(),
            relative_path: ".".to_string(),
            locality: Locality::Local,
        }
    }

    #[test]
    fn test_upsert_insert_then_unchanged() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        let rec = record("/src", "a.txt", "h1", 1000);

        assert_eq!(catalog.upsert(&rec).unwrap(), UpsertOutcome::Inserted);
        assert_eq!(catalog.upsert(&rec).unwrap(), UpsertOutcome::Unchanged);
        assert_eq!(catalog.len().unwrap(), 1);
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        catalog.upsert(&record("/src", "a.txt", "h1", 1000)).unwrap();

        let changed = record("/src", "a.txt", "h2", 2000);
        assert_eq!(catalog.upsert(&changed).unwrap(), UpsertOutcome::Updated);
        assert_eq!(catalog.len().unwrap(), 1);

        let stored = catalog.get("/src", "a.txt", Locality::Local).unwrap().unwrap();
        assert_eq!(stored.fingerprint, "h2");
        assert_eq!(stored.modified_at, changed.modified_at);
    }

    #[test]
    fn test_lookup_partitions_by_locality() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        let mut remote = record("/src", "a.txt", "h1", 1000);
        remote.locality = Locality::Remote;
        catalog.upsert(&remote).unwrap();

        assert!(catalog.lookup("/src", ".", "a.txt", Locality::Local).unwrap().is_none());
        assert!(catalog.lookup("/src", ".", "a.txt", Locality::Remote).unwrap().is_some());
    }

    #[test]
    fn test_same_path_keeps_separate_local_and_remote_rows() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        let local = record("/data/photos", "a.jpg", "local-h1", 1000);
        let mut remote = record("/data/photos", "a.jpg", "remote-h2", 2000);
        remote.tree_root = "/data/photos".to_string();
        remote.locality = Locality::Remote;

        assert_eq!(catalog.upsert(&local).unwrap(), UpsertOutcome::Inserted);
        assert_eq!(catalog.upsert(&remote).unwrap(), UpsertOutcome::Inserted);
        assert_eq!(catalog.upsert(&remote).unwrap(), UpsertOutcome::Unchanged);
        assert_eq!(catalog.len().unwrap(), 2);

        let stored_local = catalog.get("/data/photos", "a.jpg", Locality::Local).unwrap().unwrap();
        let stored_remote = catalog.get("/data/photos", "a.jpg", Locality::Remote).unwrap().unwrap();
        assert_eq!(stored_local.fingerprint, "local-h1");
        assert_eq!(stored_remote.fingerprint, "remote-h2");
        assert_eq!(stored_remote.locality, Locality::Remote);

        assert!(catalog.delete("/data/photos", "a.jpg", Locality::Remote).unwrap());
        assert!(catalog.get("/data/photos", "a.jpg", Locality::Local).unwrap().is_some());
    }

    #[test]
    fn test_all_records_ordered() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        catalog.upsert(&record("/src/b", "z.txt", "h", 1)).unwrap();
        catalog.upsert(&record("/src/a", "y.txt", "h", 1)).unwrap();
        catalog.upsert(&record("/src/a", "x.txt", "h", 1)).unwrap();

        let names: Vec<_> = catalog
            .all_records()
            .unwrap()
            .into_iter()
            .map(|r| format!("{}/{}", r.directory, r.name))
            .collect();
        assert_eq!(names, vec!["/src/a/x.txt", "/src/a/y.txt", "/src/b/z.txt"]);
    }

    #[test]
    fn test_delete_removes_exactly_one() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        catalog.upsert(&record("/src", "a.txt", "h", 1)).unwrap();
        catalog.upsert(&record("/src", "b.txt", "h", 1)).unwrap();

        assert!(catalog.delete("/src", "a.txt", Locality::Local).unwrap());
        assert!(!catalog.delete("/src", "a.txt", Locality::Local).unwrap());
        assert!(!catalog.delete("/src", "b.txt", Locality::Remote).unwrap());
        assert_eq!(catalog.len().unwrap(), 1);
    }

    #[test]
    fn test_file_name_is_stable_and_pair_specific() {
        let a = Catalog::file_name_for("/src", "/tgt", None);
        let b = Catalog::file_name_for("/src", "/tgt", None);
        let c = Catalog::file_name_for("/src", "/tgt", Some("nas"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.ends_with(".db"));
        assert_eq!(a.len(), 35);
    }

    #[test]
    fn test_catalog_persists_across_handles() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.db");

        {
            let mut catalog = Catalog::open(&path).unwrap();
            catalog.upsert(&record("/src", "a.txt", "h1", 1)).unwrap();
        }

        let catalog = Catalog::open(&path).unwrap();
        assert_eq!(catalog.path(), Some(path.as_path()));
        assert_eq!(catalog.len().unwrap(), 1);
    }
}
