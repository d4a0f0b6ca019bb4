//! FileRecord - One tracked file in the catalog

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// Relative path stored for files sitting directly under a tree root
pub const ROOT_RELATIVE_PATH: &str = ".";

/// Which execution context owns a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locality {
    /// Reachable through the local filesystem API
    Local,
    /// Reachable only through the remote bridge
    Remote,
}

impl Locality {
    /// Single-letter code stored in the `local_rmt` column
    pub fn code(self) -> &'static str {
        match self {
            Locality::Local => "L",
            Locality::Remote => "R",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "L" => Some(Locality::Local),
            "R" => Some(Locality::Remote),
            _ => None,
        }
    }
}

impl fmt::Display for Locality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locality::Local => write!(f, "local"),
            Locality::Remote => write!(f, "remote"),
        }
    }
}

impl ToSql for Locality {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Locality {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_str()?;
        Locality::from_code(code).ok_or_else(|| FromSqlError::Other(
            format!("unknown locality code '{}'", code).into(),
        ))
    }
}

/// Sortable modification timestamp (`YYYY-MM-DD-HH.MM.SS`, UTC)
///
/// Every field is fixed width, so string order equals chronological order.
/// Comparisons between records are done on this string, never on numeric time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub const FORMAT: &'static str = "%Y-%m-%d-%H.%M.%S";

    pub fn from_system_time(time: SystemTime) -> Self {
        let utc: DateTime<Utc> = time.into();
        Self(utc.format(Self::FORMAT).to_string())
    }

    /// Parse an encoded timestamp, rejecting anything not in canonical form
    pub fn parse(encoded: &str) -> Option<Self> {
        let parsed = NaiveDateTime::parse_from_str(encoded, Self::FORMAT).ok()?;
        let canonical = parsed.format(Self::FORMAT).to_string();
        (canonical == encoded).then_some(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(|s| Timestamp(s.to_string()))
    }
}

/// Last known state of one file under a tree root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path of the containing directory
    pub directory: String,

    /// File name within `directory`
    pub name: String,

    /// Hex content hash
    pub fingerprint: String,

    pub modified_at: Timestamp,

    /// Size in bytes at scan time
    pub size: u64,

    /// Root the file was discovered under
    pub tree_root: String,

    /// `directory` relative to `tree_root`, `/`-separated, `"."` at the root
    pub relative_path: String,

    pub locality: Locality,
}

impl FileRecord {
    /// Full path of the file using the given separator
    pub fn full_path(&self, separator: &str) -> String {
        join_path(&self.directory, &self.name, separator)
    }

    /// Whether a rescan observed different content or metadata
    pub fn differs_from(&self, other: &FileRecord) -> bool {
        self.fingerprint != other.fingerprint
            || self.modified_at != other.modified_at
            || self.size != other.size
    }
}

/// Join a directory and a child segment without doubling the separator
pub fn join_path(directory: &str, child: &str, separator: &str) -> String {
    if directory.is_empty() {
        child.to_string()
    } else if directory.ends_with(separator) {
        format!("{}{}", directory, child)
    } else {
        format!("{}{}{}", directory, separator, child)
    }
}

/// Directory under `root` corresponding to a stored relative path
///
/// `"."` maps to the root itself; `/` segments are translated to `separator`.
pub fn resolve_relative(root: &str, relative_path: &str, separator: &str) -> String {
    if relative_path == ROOT_RELATIVE_PATH || relative_path.is_empty() {
        root.to_string()
    } else {
        join_path(root, &relative_path.replace('/', separator), separator)
    }
}

/// Normalize a host-native relative directory into the stored `/` form
pub fn normalize_relative(native: &str, separator: &str) -> String {
    let trimmed = native.trim_matches(|c| separator.contains(c));
    if trimmed.is_empty() || trimmed == ROOT_RELATIVE_PATH {
        ROOT_RELATIVE_PATH.to_string()
    } else if separator == "/" {
        trimmed.to_string()
    } else {
        trimmed.replace(separator, "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_timestamp_format_is_fixed_width() {
        let ts = Timestamp::from_system_time(UNIX_EPOCH + Duration::from_secs(86_400 + 3_661));
        assert_eq!(ts.as_str(), "1970-01-02-01.01.01");
        assert_eq!(ts.as_str().len(), 19);
    }

    #[test]
    fn test_timestamp_order_matches_time_order() {
        let earlier = Timestamp::from_system_time(UNIX_EPOCH + Duration::from_secs(9));
        let later = Timestamp::from_system_time(UNIX_EPOCH + Duration::from_secs(10));
        let much_later = Timestamp::from_system_time(UNIX_EPOCH + Duration::from_secs(1_000_000_000));

        assert!(earlier < later);
        assert!(later < much_later);
        assert!(earlier.as_str() < later.as_str());
    }

    #[test]
    fn test_timestamp_parse_rejects_non_canonical() {
        assert!(Timestamp::parse("2024-03-01-12.30.05").is_some());
        assert!(Timestamp::parse("2024-3-1-12.30.05").is_none());
        assert!(Timestamp::parse("2024-03-01 12:30:05").is_none());
        assert!(Timestamp::parse("").is_none());
    }

    #[test]
    fn test_locality_codes_round_trip() {
        for locality in [Locality::Local, Locality::Remote] {
            assert_eq!(Locality::from_code(locality.code()), Some(locality));
        }
        assert_eq!(Locality::from_code("X"), None);
    }

    #[test]
    fn test_resolve_relative_root_has_no_extra_separator() {
        assert_eq!(resolve_relative("/tgt", ".", "/"), "/tgt");
        assert_eq!(resolve_relative("/tgt", "a/b", "/"), "/tgt/a/b");
        assert_eq!(resolve_relative("/tgt/", "a", "/"), "/tgt/a");
        assert_eq!(resolve_relative("D:\\tgt", "a/b", "\\"), "D:\\tgt\\a\\b");
    }

    #[test]
    fn test_normalize_relative() {
        assert_eq!(normalize_relative("", "/"), ".");
        assert_eq!(normalize_relative(".", "/"), ".");
        assert_eq!(normalize_relative("a/b", "/"), "a/b");
        assert_eq!(normalize_relative("a\\b\\", "\\"), "a/b");
    }

    #[test]
    fn test_differs_from() {
        let base = FileRecord {
            directory: "/src".to_string(),
            name: "a.txt".to_string(),
            fingerprint: "h1".to_string(),
            modified_at: Timestamp::from_system_time(UNIX_EPOCH),
            size: 3,
            tree_root: "/src".to_string(),
            relative_path: ".".to_string(),
            locality: Locality::Local,
        };
        let mut same = base.clone();
        same.tree_root = "/elsewhere".to_string();
        assert!(!base.differs_from(&same));

        let mut resized = base.clone();
        resized.size = 4;
        assert!(base.differs_from(&resized));
    }
}
