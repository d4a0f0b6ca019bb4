//! Configuration management
//!
//! Command line (clap) plus an optional TOML file holding the extension
//! lists and remote host defaults. CLI flags win over file values.

use crate::catalog::Catalog;
use crate::remote::{RemoteCredentials, DEFAULT_AGENT_PATH, DEFAULT_SSH_PORT};
use crate::scanner::ExtensionPolicy;
use crate::types::SyncError;
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "data/syncat.toml";

#[derive(Debug, Parser)]
#[command(name = "syncat")]
#[command(version, about = "Catalog-backed one-way directory sync with duplicate detection")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors, hide progress bars
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Copy missing and newer files from SOURCE to TARGET (simulated unless --copy)
    Sync(SyncArgs),
    /// List files with identical content under one directory
    Dupes(DupesArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SyncArgs {
    /// Local source directory
    pub source: PathBuf,

    /// Target directory, on the remote host when --remote is set
    pub target: String,

    /// Actually copy files; without it the run only reports what it would do
    #[arg(long)]
    pub copy: bool,

    /// TARGET lives on a remote host reached over ssh
    #[arg(long)]
    pub remote: bool,

    /// TOML file with extension lists and remote defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding the catalog database (default: SOURCE)
    #[arg(long)]
    pub catalog_dir: Option<PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub user: Option<String>,

    /// Private key file for ssh
    #[arg(long)]
    pub identity: Option<PathBuf>,

    /// Path of syncat-agent on the remote host
    #[arg(long)]
    pub agent: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct DupesArgs {
    /// Directory to inspect
    pub dir: PathBuf,

    /// Refresh the catalog from disk before listing
    #[arg(long)]
    pub scan: bool,

    /// TOML file with extension lists (read only with --scan)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding the catalog database (default: DIR)
    #[arg(long)]
    pub catalog_dir: Option<PathBuf>,
}

/// Contents of the TOML config file
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub extensions: ExtensionSection,
    pub remote: RemoteSection,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ExtensionSection {
    pub accept: Vec<String>,
    pub reject: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub identity_file: Option<PathBuf>,
    pub agent_path: Option<String>,
}

impl FileConfig {
    /// Read a config file; a missing file is an error naming the path
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let text = fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
            .map_err(|e| SyncError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(text: &str) -> Result<Self, SyncError> {
        toml::from_str(text).map_err(|e| SyncError::Config(format!("Invalid config: {}", e)))
    }

    pub fn policy(&self) -> ExtensionPolicy {
        ExtensionPolicy::new(&self.extensions.accept, &self.extensions.reject)
    }

    fn load_or_default_path(path: Option<&Path>) -> Result<Self, SyncError> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        info!("Reading configuration from {}", path.display());
        Self::load(path)
    }
}

/// Where copies go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetLocation {
    Local(PathBuf),
    Remote {
        root: String,
        credentials: RemoteCredentials,
    },
}

impl TargetLocation {
    /// Root as stored in the catalog
    pub fn root(&self) -> String {
        match self {
            TargetLocation::Local(path) => path.to_string_lossy().into_owned(),
            TargetLocation::Remote { root, .. } => root.clone(),
        }
    }

    pub fn host(&self) -> Option<&str> {
        match self {
            TargetLocation::Local(_) => None,
            TargetLocation::Remote { credentials, .. } => Some(&credentials.host),
        }
    }
}

/// Validated settings for one sync run
#[derive(Debug, Clone)]
pub struct Config {
    /// Canonical local source root
    pub source: PathBuf,
    pub target: TargetLocation,
    /// Decide and report only; no copies, no target catalog writes
    pub simulate: bool,
    pub policy: ExtensionPolicy,
    pub catalog_dir: PathBuf,
}

impl Config {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), SyncError> {
        if !self.source.is_dir() {
            return Err(SyncError::Config(format!(
                "Source path is not a directory: {}",
                self.source.display()
            )));
        }

        if let TargetLocation::Local(target) = &self.target {
            if target == &self.source {
                return Err(SyncError::Config(
                    "Source and target cannot be the same".to_string(),
                ));
            }
        }

        if let TargetLocation::Remote { root, credentials } = &self.target {
            if root.is_empty() {
                return Err(SyncError::Config("Remote target path is empty".to_string()));
            }
            if credentials.host.is_empty() || credentials.user.is_empty() {
                return Err(SyncError::Config(
                    "A remote target needs both a host and a user".to_string(),
                ));
            }
        }

        if self.policy.accepted().is_empty() {
            return Err(SyncError::Config(
                "No accepted extensions configured; nothing would be scanned".to_string(),
            ));
        }

        Ok(())
    }

    /// Catalog file for this (source, target, host) combination
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog_dir.join(Catalog::file_name_for(
            &self.source.to_string_lossy(),
            &self.target.root(),
            self.target.host(),
        ))
    }
}

impl TryFrom<SyncArgs> for Config {
    type Error = SyncError;

    fn try_from(args: SyncArgs) -> Result<Self, Self::Error> {
        let file = FileConfig::load_or_default_path(args.config.as_deref())?;
        let source = canonical_dir(&args.source, "Source")?;

        let target = if args.remote {
            let remote = file.remote;
            let mut credentials = RemoteCredentials::new(
                args.host.or(remote.host).unwrap_or_default(),
                args.user.or(remote.user).unwrap_or_default(),
            );
            credentials.port = args.port.or(remote.port).unwrap_or(DEFAULT_SSH_PORT);
            credentials.identity_file = args.identity.or(remote.identity_file).map(expand_home);
            credentials.agent_path = args
                .agent
                .or(remote.agent_path)
                .unwrap_or_else(|| DEFAULT_AGENT_PATH.to_string());
            TargetLocation::Remote {
                root: trim_trailing_separator(&args.target),
                credentials,
            }
        } else {
            TargetLocation::Local(absolute(Path::new(&args.target))?)
        };

        let config = Config {
            catalog_dir: args.catalog_dir.unwrap_or_else(|| source.clone()),
            source,
            target,
            simulate: !args.copy,
            policy: ExtensionPolicy::new(&file.extensions.accept, &file.extensions.reject),
        };
        config.validate()?;
        config.prepare_target()
    }
}

impl Config {
    /// Create a missing local target and settle on its canonical path
    fn prepare_target(mut self) -> Result<Self, SyncError> {
        if let TargetLocation::Local(path) = &self.target {
            if !path.exists() {
                info!("Creating target directory {}", path.display());
                fs::create_dir_all(path).map_err(SyncError::Io)?;
            }
            let canonical = canonical_dir(path, "Target")?;
            if canonical == self.source {
                return Err(SyncError::Config(
                    "Source and target cannot be the same".to_string(),
                ));
            }
            self.target = TargetLocation::Local(canonical);
        }
        Ok(self)
    }
}

/// Validated settings for the duplicate listing
#[derive(Debug, Clone)]
pub struct DupesConfig {
    pub root: PathBuf,
    pub rescan: bool,
    /// Only needed when rescanning
    pub policy: Option<ExtensionPolicy>,
    pub catalog_dir: PathBuf,
}

impl DupesConfig {
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog_dir
            .join(Catalog::file_name_for(&self.root.to_string_lossy(), "", None))
    }
}

impl TryFrom<DupesArgs> for DupesConfig {
    type Error = SyncError;

    fn try_from(args: DupesArgs) -> Result<Self, Self::Error> {
        let root = canonical_dir(&args.dir, "Directory")?;
        let policy = if args.scan {
            Some(FileConfig::load_or_default_path(args.config.as_deref())?.policy())
        } else {
            None
        };
        Ok(DupesConfig {
            catalog_dir: args.catalog_dir.unwrap_or_else(|| root.clone()),
            root,
            rescan: args.scan,
            policy,
        })
    }
}

fn canonical_dir(path: &Path, what: &str) -> Result<PathBuf, SyncError> {
    let canonical = path.canonicalize().map_err(|e| {
        SyncError::Config(format!("{} path {} is unusable: {}", what, path.display(), e))
    })?;
    if !canonical.is_dir() {
        return Err(SyncError::Config(format!(
            "{} path is not a directory: {}",
            what,
            path.display()
        )));
    }
    Ok(canonical)
}

fn absolute(path: &Path) -> Result<PathBuf, SyncError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir().map_err(SyncError::Io)?.join(path))
    }
}

/// `"/data/photos/"` → `"/data/photos"`; a bare root separator is kept
fn trim_trailing_separator(path: &str) -> String {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() {
        path.chars().take(1).collect()
    } else {
        trimmed.to_string()
    }
}

fn expand_home(path: PathBuf) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[extensions]
accept = [".JPG", "png"]
reject = [".tmp"]

[remote]
host = "nas"
user = "me"
port = 2222
agent_path = "/opt/syncat-agent"
"#;

    fn write_config(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("syncat.toml");
        fs::write(&path, SAMPLE).unwrap();
        path
    }

    fn sync_args(source: &Path, target: &str, config: &Path) -> SyncArgs {
        SyncArgs {
            source: source.to_path_buf(),
            target: target.to_string(),
            copy: false,
            remote: false,
            config: Some(config.to_path_buf()),
            catalog_dir: None,
            host: None,
            port: None,
            user: None,
            identity: None,
            agent: None,
        }
    }

    #[test]
    fn test_parse_file_config() {
        let file = FileConfig::parse(SAMPLE).unwrap();
        assert_eq!(file.policy().accepted(), &[".jpg", ".png"]);
        assert_eq!(file.remote.port, Some(2222));
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let result = FileConfig::parse("[extensions]\nallow = [\".jpg\"]\n");
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[test]
    fn test_missing_config_file_names_path() {
        let err = FileConfig::load(Path::new("/nonexistent/syncat.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/syncat.toml"));
    }

    #[test]
    fn test_local_config_creates_target_and_defaults_to_simulate() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(&temp_dir);
        let source = temp_dir.path().join("src");
        fs::create_dir(&source).unwrap();
        let target = temp_dir.path().join("tgt");

        let config =
            Config::try_from(sync_args(&source, &target.to_string_lossy(), &config_path)).unwrap();

        assert!(config.simulate);
        assert!(target.is_dir());
        assert_eq!(config.catalog_dir, config.source);
        assert!(matches!(config.target, TargetLocation::Local(_)));
        assert!(config
            .catalog_path()
            .to_string_lossy()
            .ends_with(".db"));
    }

    #[test]
    fn test_source_equal_to_target_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(&temp_dir);
        let source = temp_dir.path().join("src");
        fs::create_dir(&source).unwrap();

        let result = Config::try_from(sync_args(&source, &source.to_string_lossy(), &config_path));
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[test]
    fn test_missing_source_is_rejected_without_creating_target() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(&temp_dir);
        let target = temp_dir.path().join("tgt");

        let result = Config::try_from(sync_args(
            &temp_dir.path().join("missing"),
            &target.to_string_lossy(),
            &config_path,
        ));
        assert!(result.is_err());
        assert!(!target.exists());
    }

    #[test]
    fn test_remote_config_merges_file_and_flags() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = write_config(&temp_dir);
        let source = temp_dir.path().join("src");
        fs::create_dir(&source).unwrap();

        let mut args = sync_args(&source, "/volume1/photos/", &config_path);
        args.remote = true;
        args.user = Some("admin".to_string());
        args.copy = true;

        let config = Config::try_from(args).unwrap();
        assert!(!config.simulate);
        match config.target {
            TargetLocation::Remote { root, credentials } => {
                assert_eq!(root, "/volume1/photos");
                assert_eq!(credentials.host, "nas");
                assert_eq!(credentials.user, "admin");
                assert_eq!(credentials.port, 2222);
                assert_eq!(credentials.agent_path, "/opt/syncat-agent");
            }
            other => panic!("expected remote target, got {:?}", other),
        }
    }

    #[test]
    fn test_remote_without_host_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bare.toml");
        fs::write(&config_path, "[extensions]\naccept = [\".jpg\"]\n").unwrap();
        let source = temp_dir.path().join("src");
        fs::create_dir(&source).unwrap();

        let mut args = sync_args(&source, "/photos", &config_path);
        args.remote = true;
        let result = Config::try_from(args);
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[test]
    fn test_trim_trailing_separator() {
        assert_eq!(trim_trailing_separator("/a/b/"), "/a/b");
        assert_eq!(trim_trailing_separator("D:\\photos\\"), "D:\\photos");
        assert_eq!(trim_trailing_separator("/"), "/");
    }

    #[test]
    fn test_cli_parses_sync_subcommand() {
        let cli = Cli::try_parse_from(["syncat", "-v", "sync", "/src", "/tgt", "--copy"]).unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Sync(args) => {
                assert!(args.copy);
                assert_eq!(args.target, "/tgt");
            }
            Command::Dupes(_) => panic!("expected sync"),
        }
    }
}
