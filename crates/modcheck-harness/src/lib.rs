//! Conformance harness for dynamically loaded server modules.
//!
//! This crate provides:
//! - Scenarios: fixed call sequences over the module ABI with literal checks
//! - Runner: load, settle, run a suite in order, summarize, unload
//! - Results and reports: per-scenario verdicts, JSON/markdown run reports
//! - Structured logging: JSONL run logs with a validated schema

#![forbid(unsafe_code)]

pub mod diff;
pub mod error;
pub mod report;
pub mod runner;
pub mod scenarios;
pub mod structured_log;
pub mod verify;

pub use error::{HarnessError, ScenarioError};
pub use report::{ReportFormat, RunReport};
pub use runner::{Finished, RunConfig, run, run_suite};
pub use scenarios::{Scenario, Suite};
pub use verify::{RunSummary, ScenarioResult};
