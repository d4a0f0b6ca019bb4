//! Main sync command
//!
//! Phase order: reconcile → scan source → duplicates in source → scan target
//! → plan and copy → duplicates in target. A failing phase is recorded and
//! the run moves on; only losing the remote bridge at startup ends it early.

use crate::catalog::Catalog;
use crate::config::{Config, TargetLocation};
use crate::dedup::{self, find_duplicates, DuplicateGroup};
use crate::diff::{generate_sync_plan, TargetTree};
use crate::executor::{execute_plan, ExecutionEvent, ExecutionStats};
use crate::fs::{FileSystem, LocalFileSystem, RemoteFileSystem};
use crate::reconcile::{reconcile, ReconcileStats};
use crate::remote::{RemoteBridge, SshChannel};
use crate::scanner::{scan_tree, ExtensionPolicy, ProgressCallback, ScanSummary};
use crate::types::{Locality, SyncError};
use crate::ui::{format_report_line, ProgressReporter};
use indicatif::HumanBytes;
use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::MAIN_SEPARATOR_STR;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// Steps of a sync run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reconcile,
    ScanSource,
    DuplicatesSource,
    ScanTarget,
    Copy,
    DuplicatesTarget,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Reconcile => "catalog reconciliation",
            Phase::ScanSource => "source scan",
            Phase::DuplicatesSource => "source duplicate check",
            Phase::ScanTarget => "target scan",
            Phase::Copy => "copy",
            Phase::DuplicatesTarget => "target duplicate check",
        };
        f.write_str(name)
    }
}

/// A phase that ended with an error
#[derive(Debug)]
pub struct PhaseError {
    pub phase: Phase,
    pub error: SyncError,
}

/// Trees and options for one run
#[derive(Debug, Clone, Copy)]
pub struct SyncJob<'a> {
    pub source_root: &'a str,
    pub target_root: &'a str,
    pub policy: &'a ExtensionPolicy,
    pub simulate: bool,
}

/// Everything a run observed; phases that failed or did not run are `None`
#[derive(Debug, Default)]
pub struct RunSummary {
    pub source_root: String,
    pub target_root: String,
    pub target_separator: String,
    pub simulate: bool,
    pub reconcile: Option<ReconcileStats>,
    pub source_scan: Option<ScanSummary>,
    pub source_duplicates: Option<Vec<DuplicateGroup>>,
    pub target_scan: Option<ScanSummary>,
    pub execution: Option<ExecutionStats>,
    pub target_duplicates: Option<Vec<DuplicateGroup>>,
    pub phase_errors: Vec<PhaseError>,
}

impl RunSummary {
    /// No phase failed and every planned copy completed
    pub fn is_clean(&self) -> bool {
        self.phase_errors.is_empty() && self.execution.as_ref().map_or(true, |e| e.is_clean())
    }

    fn settle<T>(&mut self, phase: Phase, result: Result<T, SyncError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                error!("{} failed: {}", phase, e);
                self.phase_errors.push(PhaseError { phase, error: e });
                None
            }
        }
    }

    /// Statistics and duplicate listings in phase order
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(stats) = &self.reconcile {
            lines.push("Catalog check".to_string());
            lines.push(format_report_line(4, "Files present", stats.found));
            lines.push(format_report_line(4, "Stale records removed", stats.missing));
            if stats.unverified > 0 {
                lines.push(format_report_line(4, "Records not verified", stats.unverified));
            }
            if stats.failed > 0 {
                lines.push(format_report_line(4, "Records not checkable", stats.failed));
            }
        }
        if let Some(scan) = &self.source_scan {
            lines.extend(scan.report_lines());
        }
        if let Some(groups) = &self.source_duplicates {
            lines.extend(dedup::report_lines(&self.source_root, groups, MAIN_SEPARATOR_STR));
        }
        if let Some(scan) = &self.target_scan {
            lines.extend(scan.report_lines());
        }
        if let Some(stats) = &self.execution {
            lines.extend(self.copy_report_lines(stats));
        }
        if let Some(groups) = &self.target_duplicates {
            lines.extend(dedup::report_lines(&self.target_root, groups, &self.target_separator));
        }

        let records = self.error_records();
        if !records.is_empty() {
            lines.push(format_error_summary(&records));
        }
        lines
    }

    fn copy_report_lines(&self, stats: &ExecutionStats) -> Vec<String> {
        let mut lines = vec![format!(
            "Copy statistics for {} -> {}{}",
            self.source_root,
            self.target_root,
            if self.simulate { " (simulated)" } else { "" }
        )];
        lines.push(format_report_line(4, "Copied", stats.copied));
        lines.push(format_report_line(4, "Compared", stats.compared));
        lines.push(format_report_line(4, "Kept (identical)", stats.kept));
        lines.push(format_report_line(4, "Replaced (source newer)", stats.newer));
        lines.push(format_report_line(4, "Protected (target newer)", stats.older));
        lines.push(format_report_line(4, "Failed", stats.failed));
        lines.push(format_report_line(4, "Bytes copied", HumanBytes(stats.bytes_copied)));
        lines
    }

    fn error_records(&self) -> Vec<ErrorRecord> {
        let mut records: Vec<ErrorRecord> = self
            .phase_errors
            .iter()
            .map(|e| ErrorRecord::new(Some(e.phase), None, &e.error))
            .collect();
        if let Some(stats) = &self.execution {
            records.extend(
                stats
                    .failures
                    .iter()
                    .map(|f| ErrorRecord::new(None, Some(&f.path), &f.error)),
            );
        }
        records
    }
}

/// Run the sync operation described by `config`
///
/// Opening the catalog or connecting to the remote host are the only
/// failures returned as errors; everything else lands in the summary.
pub fn run(config: &Config, quiet: bool) -> Result<RunSummary, SyncError> {
    let catalog_path = config.catalog_path();
    let mut catalog = Catalog::open(&catalog_path)?;
    info!("Using catalog {}", catalog_path.display());

    let reporter = Arc::new(Mutex::new(if quiet {
        ProgressReporter::hidden()
    } else {
        ProgressReporter::new()
    }));

    let source_root = config.source.to_string_lossy().into_owned();
    let target_root = config.target.root();
    let job = SyncJob {
        source_root: &source_root,
        target_root: &target_root,
        policy: &config.policy,
        simulate: config.simulate,
    };
    if job.simulate {
        info!("Simulation: nothing will be copied (use --copy to copy)");
    }

    let summary = match &config.target {
        TargetLocation::Local(_) => {
            run_with(&job, &mut catalog, &mut LocalFileSystem::new(), &reporter)
        }
        TargetLocation::Remote { credentials, .. } => {
            let bridge = RemoteBridge::connect(SshChannel::new(credentials.clone()))?;
            let mut remote = RemoteFileSystem::new(bridge);
            run_with(&job, &mut catalog, &mut remote, &reporter)
        }
    };

    for line in summary.report_lines() {
        println!("{}", line);
    }
    Ok(summary)
}

/// Run every phase against an already open catalog and target
pub fn run_with(
    job: &SyncJob<'_>,
    catalog: &mut Catalog,
    target: &mut dyn FileSystem,
    reporter: &Arc<Mutex<ProgressReporter>>,
) -> RunSummary {
    let mut summary = RunSummary {
        source_root: job.source_root.to_string(),
        target_root: job.target_root.to_string(),
        target_separator: target.separator().to_string(),
        simulate: job.simulate,
        ..Default::default()
    };
    let mut source = LocalFileSystem::new();
    let target_locality = target.locality();

    let reconciled = {
        let remote_target = target_locality == Locality::Remote;
        let mut filesystems: Vec<&mut dyn FileSystem> = vec![&mut source];
        if remote_target {
            filesystems.push(&mut *target);
        }
        reconcile(catalog, &mut filesystems)
    };
    summary.reconcile = summary.settle(Phase::Reconcile, reconciled);

    let scanned = scan_with_progress(
        &mut source,
        catalog,
        job.source_root,
        job.policy,
        "source",
        reporter,
    );
    summary.source_scan = summary.settle(Phase::ScanSource, scanned);
    summary.source_duplicates =
        summary.settle(Phase::DuplicatesSource, find_duplicates(catalog, job.source_root, Locality::Local));

    let scanned = target.ensure_dir(job.target_root).and_then(|()| {
        scan_with_progress(target, catalog, job.target_root, job.policy, "target", reporter)
    });
    summary.target_scan = summary.settle(Phase::ScanTarget, scanned);
    if let Ok(progress) = reporter.lock() {
        progress.finish_scanning();
    }

    // Planning against a stale target catalog could overwrite newer target files
    if summary.source_scan.is_some() && summary.target_scan.is_some() {
        let executed = plan_and_execute(job, catalog, target, reporter);
        summary.execution = summary.settle(Phase::Copy, executed);
    } else {
        warn!("Copy phase skipped because a tree could not be scanned");
    }

    summary.target_duplicates =
        summary.settle(Phase::DuplicatesTarget, find_duplicates(catalog, job.target_root, target_locality));
    summary
}

fn scan_with_progress(
    fs: &mut dyn FileSystem,
    catalog: &mut Catalog,
    root: &str,
    policy: &ExtensionPolicy,
    label: &'static str,
    reporter: &Arc<Mutex<ProgressReporter>>,
) -> Result<ScanSummary, SyncError> {
    if let Ok(progress) = reporter.lock() {
        progress.start_scan(label);
    }
    let on_progress: ProgressCallback = {
        let reporter = Arc::clone(reporter);
        Box::new(move |files: u64, bytes: u64| {
            if let Ok(progress) = reporter.lock() {
                progress.update_scan(label, files, bytes);
            }
        })
    };

    let result = scan_tree(fs, catalog, root, policy, Some(&on_progress));
    if let (Ok(scan), Ok(progress)) = (&result, reporter.lock()) {
        progress.finish_scan(label, scan.recorded(), scan.bytes);
    }
    result
}

fn plan_and_execute(
    job: &SyncJob<'_>,
    catalog: &mut Catalog,
    target: &mut dyn FileSystem,
    reporter: &Arc<Mutex<ProgressReporter>>,
) -> Result<ExecutionStats, SyncError> {
    let separator = target.separator().to_string();
    let plan = generate_sync_plan(
        catalog,
        job.source_root,
        TargetTree {
            root: job.target_root,
            locality: target.locality(),
            separator: &separator,
        },
    )?;
    info!(
        "Plan: {} new, {} newer, {} identical, {} protected, {} to transfer",
        plan.stats.copy,
        plan.stats.newer,
        plan.stats.kept,
        plan.stats.older,
        HumanBytes(plan.stats.transfer_bytes)
    );

    let show_copies = plan.has_transfers();
    if !show_copies {
        info!("Nothing to copy.");
    } else if let Ok(mut progress) = reporter.lock() {
        progress.start_transfer(plan.stats.transfer_files as u64, job.simulate);
    }

    let on_event = {
        let reporter = Arc::clone(reporter);
        move |event: &ExecutionEvent<'_>| match event {
            ExecutionEvent::CopyStart { action, path, .. } => {
                if let Ok(progress) = reporter.lock() {
                    progress.set_current_file(action, path);
                }
            }
            ExecutionEvent::CopySuccess { bytes_copied, .. } => {
                if let Ok(mut progress) = reporter.lock() {
                    progress.complete_transfer_file(*bytes_copied);
                }
            }
            ExecutionEvent::CopyError {
                action,
                path,
                error,
                ..
            } => {
                if let Ok(mut progress) = reporter.lock() {
                    progress.transfer_error(action, path, &error.to_string());
                }
            }
            ExecutionEvent::Complete { stats } => {
                if !show_copies {
                    return;
                }
                if let Ok(progress) = reporter.lock() {
                    progress.finish_transfer(stats);
                }
            }
        }
    };

    execute_plan(&plan, catalog, target, job.simulate, Some(&on_event))
}

#[derive(Debug)]
struct ErrorRecord {
    kind: &'static str,
    phase: Option<Phase>,
    path: Option<String>,
    message: String,
    suggestion: Option<String>,
}

impl ErrorRecord {
    fn new(phase: Option<Phase>, path: Option<&str>, error: &SyncError) -> Self {
        let (message, suggestion) = humanize_error(error);
        Self {
            kind: error.kind_label(),
            phase,
            path: path.map(str::to_string),
            message,
            suggestion,
        }
    }
}

fn humanize_error(error: &SyncError) -> (String, Option<String>) {
    match error {
        SyncError::Io(io) => match io.kind() {
            ErrorKind::NotFound => (
                "File or directory was not found".to_string(),
                Some("Verify the path still exists and retry.".to_string()),
            ),
            ErrorKind::PermissionDenied => (
                "Permission denied while accessing file".to_string(),
                Some("Check file permissions or run with a user that has access.".to_string()),
            ),
            _ => (
                format!("I/O operation failed: {}", io),
                Some("Retry the sync. If this keeps happening, check disk health.".to_string()),
            ),
        },
        SyncError::Catalog(e) => (
            format!("Catalog operation failed: {}", e),
            Some("Check that the catalog directory is writable and not full.".to_string()),
        ),
        SyncError::Connection(msg) => (
            msg.clone(),
            Some("Check SSH connectivity and credentials.".to_string()),
        ),
        SyncError::Decode(msg) => (
            format!("Unexpected reply from the remote agent: {}", msg),
            Some("Make sure the remote syncat-agent matches this version.".to_string()),
        ),
        SyncError::CopyFailure { attempts, .. } => (
            format!("Transfer did not complete after {} attempts", attempts),
            Some("Retry the sync once the connection is stable.".to_string()),
        ),
        SyncError::Config(msg) | SyncError::Validation(msg) => (msg.clone(), None),
    }
}

fn format_error_summary(records: &[ErrorRecord]) -> String {
    let mut groups: BTreeMap<&'static str, Vec<&ErrorRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.kind).or_default().push(record);
    }

    let mut lines = Vec::new();
    lines.push("Error summary:".to_string());
    for (kind, items) in groups {
        lines.push(format!("  {} ({}):", kind, items.len()));
        for record in items.iter().take(3) {
            match record.phase {
                Some(phase) => lines.push(format!("    - {} ({})", record.message, phase)),
                None => lines.push(format!("    - {}", record.message)),
            }
            if let Some(path) = &record.path {
                lines.push(format!("      Path: {}", path));
            }
            if let Some(suggestion) = &record.suggestion {
                lines.push(format!("      Try: {}", suggestion));
            }
        }
        if items.len() > 3 {
            lines.push(format!("    - ... {} more", items.len() - 3));
        }
    }
    lines.join("\n")
}
