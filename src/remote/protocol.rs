//! Agent request/response wire format
//!
//! Each request is one self-contained `syncat-agent` invocation. Scan replies
//! are a JSON object holding the file descriptors and the extension tally;
//! every other reply is a single line.

use crate::scanner::ScanListing;
use crate::types::{SyncError, Timestamp};
use clap::{Parser, Subcommand};

/// Appended to a remote file's name while its upload is in flight
pub const PART_SUFFIX: &str = ".part";

/// Where an upload to `path` is written before it is committed
pub fn part_path(path: &str) -> String {
    format!("{}{}", path, PART_SUFFIX)
}

/// Command line understood by the remote companion program
#[derive(Debug, Parser)]
#[command(name = "syncat-agent")]
#[command(about = "Remote companion for syncat: scan, fingerprint and probe files on this host")]
pub struct AgentCli {
    #[command(subcommand)]
    pub command: AgentCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum AgentCommand {
    /// List eligible files under a root as JSON
    Scan {
        #[arg(short = 'd', long = "dir")]
        root: String,
        /// Comma-separated accepted extensions
        #[arg(short, long, default_value = "")]
        accept: String,
        /// Comma-separated rejected extensions
        #[arg(short, long, default_value = "")]
        reject: String,
    },
    /// Print the content fingerprint of one file
    Hash {
        #[arg(short, long)]
        dir: String,
        #[arg(short, long)]
        file: String,
    },
    /// Print whether a path exists, optionally creating a missing directory
    Probe {
        #[arg(short, long)]
        path: String,
        #[arg(long)]
        create: bool,
    },
    /// Print this host's path separator
    Sep,
    /// Move a finished `<path>.part` upload into place
    Commit {
        #[arg(short, long)]
        path: String,
    },
    /// Remove an unfinished `<path>.part` upload, printing whether one existed
    Discard {
        #[arg(short, long)]
        path: String,
    },
}

impl AgentCommand {
    /// Arguments following the agent program name
    ///
    /// Values are attached with `=` so names starting with `-` survive parsing.
    pub fn to_args(&self) -> Vec<String> {
        match self {
            AgentCommand::Scan {
                root,
                accept,
                reject,
            } => vec![
                "scan".to_string(),
                format!("--dir={}", root),
                format!("--accept={}", accept),
                format!("--reject={}", reject),
            ],
            AgentCommand::Hash { dir, file } => vec![
                "hash".to_string(),
                format!("--dir={}", dir),
                format!("--file={}", file),
            ],
            AgentCommand::Probe { path, create } => {
                let mut args = vec!["probe".to_string(), format!("--path={}", path)];
                if *create {
                    args.push("--create".to_string());
                }
                args
            }
            AgentCommand::Sep => vec!["sep".to_string()],
            AgentCommand::Commit { path } => {
                vec!["commit".to_string(), format!("--path={}", path)]
            }
            AgentCommand::Discard { path } => {
                vec!["discard".to_string(), format!("--path={}", path)]
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AgentCommand::Scan { .. } => "scan",
            AgentCommand::Hash { .. } => "hash",
            AgentCommand::Probe { .. } => "probe",
            AgentCommand::Sep => "sep",
            AgentCommand::Commit { .. } => "commit",
            AgentCommand::Discard { .. } => "discard",
        }
    }
}

pub fn encode_scan(listing: &ScanListing) -> Result<String, SyncError> {
    serde_json::to_string_pretty(listing).map_err(|e| SyncError::Decode(e.to_string()))
}

pub fn decode_scan(payload: &str) -> Result<ScanListing, SyncError> {
    let listing: ScanListing = serde_json::from_str(payload)
        .map_err(|e| SyncError::Decode(format!("invalid scan reply: {}", e)))?;

    for entry in &listing.files {
        if Timestamp::parse(entry.modified_at.as_str()).is_none() {
            return Err(SyncError::Decode(format!(
                "invalid mtime '{}' for {}",
                entry.modified_at, entry.name
            )));
        }
        if entry.name.is_empty() || entry.directory.is_empty() {
            return Err(SyncError::Decode(
                "scan entry with empty dir or name".to_string(),
            ));
        }
    }
    Ok(listing)
}

/// Single-line reply, trailing newline stripped
pub fn decode_scalar(payload: &str) -> Result<String, SyncError> {
    let mut lines = payload.lines().filter(|line| !line.trim().is_empty());
    match (lines.next(), lines.next()) {
        (Some(line), None) => Ok(line.trim_end_matches('\r').to_string()),
        (None, _) => Err(SyncError::Decode("empty reply".to_string())),
        (Some(_), Some(_)) => Err(SyncError::Decode(format!(
            "expected a single line, got: {}",
            payload.trim()
        ))),
    }
}

pub fn decode_fingerprint(payload: &str) -> Result<String, SyncError> {
    let line = decode_scalar(payload)?;
    let hex = line.trim();
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SyncError::Decode(format!("not a hex fingerprint: {}", hex)));
    }
    Ok(hex.to_ascii_lowercase())
}

pub fn decode_probe(payload: &str) -> Result<bool, SyncError> {
    match decode_scalar(payload)?.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(SyncError::Decode(format!("not a probe answer: {}", other))),
    }
}

pub fn decode_separator(payload: &str) -> Result<String, SyncError> {
    let line = decode_scalar(payload)?;
    let separator = line.trim();
    if separator.is_empty() || separator.chars().count() != 1 {
        return Err(SyncError::Decode(format!("not a path separator: {:?}", line)));
    }
    Ok(separator.to_string())
}
