//! Run orchestration: load, settle, run every scenario, summarize, release.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use modcheck_core::{Module, SymbolSource};
use serde_json::json;

use crate::diff::render_diff;
use crate::error::{HarnessError, ScenarioError};
use crate::report::{ReportFormat, RunReport};
use crate::scenarios::{Suite, Trace};
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};
use crate::verify::{RunSummary, ScenarioResult};

/// Pause between loading the module and the first call.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(1000);

/// Everything a run needs, as parsed from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub module: PathBuf,
    pub settle: Duration,
    pub suite: Suite,
    pub log: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub report_format: ReportFormat,
}

impl RunConfig {
    #[must_use]
    pub fn new(module: impl Into<PathBuf>) -> Self {
        Self {
            module: module.into(),
            settle: DEFAULT_SETTLE,
            suite: Suite::default(),
            log: None,
            report: None,
            report_format: ReportFormat::default(),
        }
    }
}

fn event(level: LogLevel, name: &str) -> LogEntry {
    LogEntry::new(String::new(), level, name)
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn new_run_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("run-{millis}-{}", std::process::id())
}

/// Run every scenario of `suite` against `module`, in order.
///
/// A failing scenario never stops the ones after it. Step lines and the
/// final summary go to `out`; failure diagnostics go to `err`. Console
/// write errors are ignored.
pub fn run_suite<M, O, E>(
    module: &M,
    suite: Suite,
    log: &mut LogEmitter,
    out: &mut O,
    err: &mut E,
) -> RunSummary
where
    M: SymbolSource,
    O: Write,
    E: Write,
{
    let mut results = Vec::with_capacity(suite.scenarios().len());

    for &scenario in suite.scenarios() {
        log.record(event(LogLevel::Debug, "scenario_start").with_scenario(scenario.name()));
        let started = Instant::now();
        let mut trace = Trace::default();
        let outcome = scenario.run(module, &mut trace);
        let duration_ms = elapsed_ms(started);

        for step in &trace.steps {
            let _ = writeln!(out, "{step}");
            log.record(
                event(LogLevel::Debug, "call_succeeded")
                    .with_scenario(scenario.name())
                    .with_symbol(step.symbol),
            );
        }
        for warning in &trace.warnings {
            let _ = writeln!(err, "warning: {scenario}: {warning}");
            log.record(
                event(LogLevel::Warn, "scenario_warning")
                    .with_scenario(scenario.name())
                    .with_details(json!({ "message": warning })),
            );
        }

        let steps = trace.symbols().into_iter().map(str::to_owned).collect();
        let result = match outcome {
            Ok(()) => {
                log.record(
                    event(LogLevel::Info, "scenario_end")
                        .with_scenario(scenario.name())
                        .with_outcome(Outcome::Pass)
                        .with_duration_ms(duration_ms),
                );
                ScenarioResult::pass(scenario.name(), steps, duration_ms)
            }
            Err(failure) => {
                let _ = writeln!(err, "{scenario} failed: {failure}");
                if let ScenarioError::ValidationMismatch {
                    expected, actual, ..
                } = &failure
                {
                    let _ = write!(err, "{}", render_diff(expected, actual));
                }
                log.record(
                    event(LogLevel::Error, "scenario_end")
                        .with_scenario(scenario.name())
                        .with_symbol(failure.symbol())
                        .with_outcome(Outcome::Fail)
                        .with_duration_ms(duration_ms)
                        .with_details(json!({
                            "kind": failure.kind(),
                            "message": failure.to_string(),
                        })),
                );
                ScenarioResult::fail(scenario.name(), failure.to_string(), steps, duration_ms)
            }
        };
        results.push(result);
    }

    let summary = RunSummary::from_results(results);
    let _ = writeln!(out, "{}", summary.summary_line());
    summary
}

/// A completed run whose module is still loaded.
///
/// The caller decides how the module goes away: [`close`](Self::close)
/// unloads it, [`leak`](Self::leak) keeps it mapped until the process
/// exits. Dropping a `Finished` unloads the module.
pub struct Finished {
    summary: RunSummary,
    module: Module,
    log: LogEmitter,
}

impl Finished {
    #[must_use]
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Unload the module. A failure to unload is a warning; it does not
    /// change the verdict.
    pub fn close(self) -> RunSummary {
        let Self {
            summary,
            module,
            mut log,
        } = self;
        if let Err(close) = module.close() {
            eprintln!("warning: {close}");
            log.record(
                event(LogLevel::Warn, "module_close_failed")
                    .with_details(json!({ "error": close.to_string() })),
            );
        }
        log.flush_best_effort();
        summary
    }

    /// Flush the log and keep the module mapped, so none of its teardown
    /// code runs before the process exits.
    pub fn leak(self) -> RunSummary {
        let Self {
            summary,
            module,
            mut log,
        } = self;
        log.record(event(LogLevel::Debug, "module_leaked"));
        log.flush_best_effort();
        module.leak();
        summary
    }
}

impl fmt::Debug for Finished {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Finished")
            .field("summary", &self.summary)
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

/// Load the module named by `config` and run its suite.
///
/// Prints `Running tests for library: <path>` before the first scenario.
/// Fails only for problems that prevent the run itself: an unopenable log
/// file or a module that does not load. Scenario failures are part of the
/// summary, and a report that cannot be written is a warning.
pub fn run(config: &RunConfig) -> Result<Finished, HarnessError> {
    let run_id = new_run_id();
    let mut log = match &config.log {
        Some(path) => {
            LogEmitter::to_file(path, &run_id).map_err(|source| HarnessError::io(path, source))?
        }
        None => LogEmitter::discard(&run_id),
    };
    log.record(event(LogLevel::Info, "run_start").with_details(json!({
        "module": config.module.display().to_string(),
        "suite": config.suite.as_str(),
        "settle_ms": u64::try_from(config.settle.as_millis()).unwrap_or(u64::MAX),
    })));

    let module = match Module::open(&config.module) {
        Ok(module) => module,
        Err(load) => {
            log.record(
                event(LogLevel::Fatal, "module_load_failed")
                    .with_exit_code(1)
                    .with_details(json!({ "error": load.to_string() })),
            );
            log.flush_best_effort();
            return Err(load.into());
        }
    };
    log.record(
        event(LogLevel::Info, "module_loaded")
            .with_details(json!({ "loader": module.loader_name() })),
    );

    // The module may finish initializing asynchronously after load.
    if !config.settle.is_zero() {
        thread::sleep(config.settle);
    }

    let mut out = io::stdout().lock();
    let mut err = io::stderr().lock();
    let _ = writeln!(out, "Running tests for library: {}", config.module.display());
    let summary = run_suite(&module, config.suite, &mut log, &mut out, &mut err);
    write_report(config, &summary, &mut log, &mut err);
    let _ = out.flush();

    log.record(
        event(LogLevel::Info, "run_end")
            .with_exit_code(i32::from(summary.exit_code()))
            .with_details(json!({ "passed": summary.passed, "total": summary.total })),
    );
    Ok(Finished {
        summary,
        module,
        log,
    })
}

/// Write the report `config` asks for, if any. Failures are reported on
/// `err` and in the log.
fn write_report<E: Write>(
    config: &RunConfig,
    summary: &RunSummary,
    log: &mut LogEmitter,
    err: &mut E,
) {
    let Some(path) = &config.report else {
        return;
    };
    let written = RunReport::new(&config.module, config.suite, summary.clone())
        .and_then(|report| report.write(path, config.report_format));
    if let Err(failure) = written {
        let _ = writeln!(err, "warning: report not written: {failure}");
        log.record(event(LogLevel::Warn, "report_failed").with_details(json!({
            "path": path.display().to_string(),
            "error": failure.to_string(),
        })));
    }
}
