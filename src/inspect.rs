//! Read-only diagnostics for a single source file.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::balance;
use crate::config::Config;
use crate::error::Error;
use crate::patch;
use crate::steps;
use crate::types::Finding;

/// Everything `inspect` found in one file.
#[derive(Debug, Serialize)]
pub struct Report {
    /// Whether there were no findings at all.
    pub clean: bool,
    /// The inspected file.
    pub file: PathBuf,
    /// Structural findings first, then blank-line runs.
    pub findings: Vec<Finding>,
    /// Number of lines in the file.
    pub lines: usize,
}

/// Read `path` and collect findings. Never writes.
///
/// # Errors
///
/// Returns `Error::FileNotFound`, `Error::FileTooLarge`, or `Error::Io`.
pub fn inspect(path: &Path, config: &Config) -> Result<Report, Error> {
    let buffer = patch::read_target(path, config)?;

    let mut findings = balance::check(&buffer.text);
    findings.extend(steps::blank_runs(&buffer.text));

    return Ok(Report {
        clean: findings.is_empty(),
        file: buffer.path,
        findings,
        lines: buffer.text.lines().count(),
    });
}

/// Print a report as plain text.
pub fn print_text(report: &Report) {
    let file = report.file.display();
    let lines = report.lines;
    if report.clean {
        println!("{file}: {lines} lines, clean");
        return;
    }

    println!("{file}: {lines} lines");
    for finding in &report.findings {
        println!("  {finding}");
    }
    let structural = report.findings.iter().filter(|f| return f.is_structural()).count();
    let layout = report.findings.len().saturating_sub(structural);
    println!("{structural} structural, {layout} layout");
}

/// Print a report as pretty JSON.
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails.
pub fn print_json(report: &Report) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    return Ok(());
}
