//! Live progress for the scan and copy phases

use crate::executor::ExecutionStats;
use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

const SPINNER_TICK: Duration = Duration::from_millis(120);

/// Spinner while trees are scanned, then a bar over the planned copies
pub struct ProgressReporter {
    spinner: ProgressBar,
    copy_bar: ProgressBar,
    copies_started_at: Option<Instant>,
    bytes_done: u64,
    simulate: bool,
}

impl ProgressReporter {
    /// Reporter drawing to stderr
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.enable_steady_tick(SPINNER_TICK);
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }

        let copy_bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(
            "{prefix:>9} [{bar:32.green/white}] {pos}/{len} | {wide_msg}",
        ) {
            copy_bar.set_style(style.progress_chars("##-"));
        }

        Self {
            spinner,
            copy_bar,
            copies_started_at: None,
            bytes_done: 0,
            simulate: false,
        }
    }

    /// Reporter that draws nothing, for `--quiet` and tests
    pub fn hidden() -> Self {
        let reporter = Self::new();
        reporter.spinner.disable_steady_tick();
        reporter.spinner.set_draw_target(ProgressDrawTarget::hidden());
        reporter.copy_bar.set_draw_target(ProgressDrawTarget::hidden());
        reporter
    }

    pub fn start_scan(&self, tree: &str) {
        self.spinner.reset();
        self.spinner.set_message(format!("Cataloging {} tree", tree));
    }

    pub fn update_scan(&self, tree: &str, files: u64, bytes: u64) {
        self.spinner.set_message(format!(
            "Cataloging {} tree: {} files, {}",
            tree,
            files,
            HumanBytes(bytes)
        ));
    }

    /// Leave a permanent line for the finished tree above the spinner
    pub fn finish_scan(&self, tree: &str, files: usize, bytes: u64) {
        self.spinner.println(format!(
            "Cataloged {} tree: {} files, {}",
            tree,
            files,
            HumanBytes(bytes)
        ));
    }

    pub fn finish_scanning(&self) {
        self.spinner.finish_and_clear();
    }

    /// Size the copy bar for `planned` transfers
    pub fn start_transfer(&mut self, planned: u64, simulate: bool) {
        self.simulate = simulate;
        self.copies_started_at = Some(Instant::now());
        self.bytes_done = 0;
        self.copy_bar
            .set_prefix(if simulate { "Simulate" } else { "Copy" });
        self.copy_bar.set_length(planned);
        self.copy_bar.set_position(0);
    }

    pub fn set_current_file(&self, action: &str, path: &str) {
        self.copy_bar.set_message(format!("{} {}", action, path));
    }

    pub fn complete_transfer_file(&mut self, bytes: u64) {
        self.bytes_done = self.bytes_done.saturating_add(bytes);
        self.copy_bar.inc(1);
        if !self.simulate {
            self.copy_bar.set_message(format!(
                "{} at {}/s",
                HumanBytes(self.bytes_done),
                HumanBytes(self.bytes_per_second())
            ));
        }
    }

    /// Print the failure above the bar and count the file as processed
    pub fn transfer_error(&mut self, action: &str, path: &str, err: &str) {
        self.copy_bar.inc(1);
        self.copy_bar
            .println(format!("FAILED {} {}: {}", action, path, err));
    }

    pub fn finish_transfer(&self, stats: &ExecutionStats) {
        let verb = if self.simulate { "would copy" } else { "copied" };
        self.copy_bar.finish_with_message(format!(
            "{} {} files ({}), {} failed",
            verb,
            stats.copied + stats.newer,
            HumanBytes(stats.bytes_copied),
            stats.failed
        ));
    }

    fn bytes_per_second(&self) -> u64 {
        let Some(started) = self.copies_started_at else {
            return 0;
        };
        let secs = started.elapsed().as_secs_f64();
        if secs > 0.0 {
            (self.bytes_done as f64 / secs) as u64
        } else {
            0
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
