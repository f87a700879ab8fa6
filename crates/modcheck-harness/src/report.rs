//! Run reports.

use std::fmt::Write as _;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::HarnessError;
use crate::scenarios::Suite;
use crate::structured_log::now_utc;
use crate::verify::RunSummary;

/// Output format for `--report`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Json,
    Markdown,
}

/// A run report: which module was tested, with which suite, and how it went.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Report title.
    pub title: String,
    /// Module path as given on the command line.
    pub module: String,
    /// SHA-256 of the module file, lowercase hex.
    pub module_sha256: String,
    pub suite: Suite,
    /// Timestamp (UTC).
    pub timestamp: String,
    pub summary: RunSummary,
}

impl RunReport {
    /// Build a report for `module`, hashing the file.
    pub fn new(module: &Path, suite: Suite, summary: RunSummary) -> Result<Self, HarnessError> {
        Ok(Self {
            title: String::from("Module Conformance Report"),
            module: module.display().to_string(),
            module_sha256: sha256_file(module)?,
            suite,
            timestamp: now_utc(),
            summary,
        })
    }

    /// Render the report as markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));
        out.push_str(&format!("- Module: `{}`\n", self.module));
        out.push_str(&format!("- SHA-256: `{}`\n", self.module_sha256));
        out.push_str(&format!("- Suite: {}\n", self.suite.as_str()));
        out.push_str(&format!("- Timestamp: {}\n", self.timestamp));
        out.push_str(&format!("- Total: {}\n", self.summary.total));
        out.push_str(&format!("- Passed: {}\n", self.summary.passed));
        out.push_str(&format!("- Failed: {}\n\n", self.summary.failed));

        out.push_str("| Scenario | Status | Duration (ms) | Failure |\n");
        out.push_str("|----------|--------|---------------|---------|\n");
        for r in &self.summary.results {
            let status = if r.passed { "PASS" } else { "FAIL" };
            let failure = r.failure.as_deref().map(table_cell).unwrap_or_default();
            out.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                r.scenario, status, r.duration_ms, failure
            ));
        }
        out
    }

    /// Render the report as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, HarnessError> {
        match format {
            ReportFormat::Json => Ok(self.to_json()?),
            ReportFormat::Markdown => Ok(self.to_markdown()),
        }
    }

    pub fn write(&self, path: &Path, format: ReportFormat) -> Result<(), HarnessError> {
        let rendered = self.render(format)?;
        std::fs::write(path, rendered).map_err(|source| HarnessError::io(path, source))
    }
}

/// Lowercase hex SHA-256 of the file at `path`.
pub fn sha256_file(path: &Path) -> Result<String, HarnessError> {
    let data = std::fs::read(path).map_err(|source| HarnessError::io(path, source))?;
    Ok(hex_lower(&Sha256::digest(&data)))
}

fn hex_lower(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut out, "{byte:02x}");
    }
    out
}

fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
