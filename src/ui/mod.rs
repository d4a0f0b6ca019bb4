//! Terminal output: progress bars and report lines

mod progress;

pub use progress::ProgressReporter;

use std::fmt::Display;

/// Column where report values start
const REPORT_VALUE_COLUMN: usize = 49;

/// Format one `"    Label......: value"` report line
///
/// The label is indented by `indent` spaces and padded with dots so that
/// values line up across a report.
pub fn format_report_line(indent: usize, label: &str, value: impl Display) -> String {
    let width = REPORT_VALUE_COLUMN.saturating_sub(indent);
    format!("{:indent$}{:.<width$}: {}", "", label, value, indent = indent, width = width)
}
