//! Catalog DDL

use rusqlite::Connection;

/// Table and indexes backing the catalog.
///
/// `pk_file_loc` enforces one current row per (dir_name, file_name,
/// local_rmt), so a local and a remote file at the same path never share a
/// row. Catalogs created with the older two-column `pk_file` lose that index
/// on open. The other indexes serve duplicate grouping and cross-tree lookups.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS file (
  dir_name   TEXT    NOT NULL,
  file_name  TEXT    NOT NULL,
  file_md5   TEXT    NOT NULL,
  file_mtime TEXT    NOT NULL,
  file_size  INTEGER NOT NULL,
  root_dir   TEXT    NOT NULL,
  rel_path   TEXT    NOT NULL,
  local_rmt  TEXT    NOT NULL DEFAULT 'L'
);
DROP INDEX IF EXISTS pk_file;
CREATE UNIQUE INDEX IF NOT EXISTS pk_file_loc ON file(dir_name, file_name, local_rmt);
CREATE INDEX        IF NOT EXISTS ix_file_01 ON file(file_md5);
CREATE INDEX        IF NOT EXISTS ix_file_02 ON file(root_dir, local_rmt, file_md5);
CREATE INDEX        IF NOT EXISTS ix_file_03 ON file(root_dir, rel_path, file_name);
";

pub(super) fn create(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "synchronous", "FULL")?;
    conn.execute_batch(SCHEMA)
}
