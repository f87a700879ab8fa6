//! CLI entrypoint for the module conformance harness.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{self, ExitCode};
use std::time::Duration;

use clap::Parser;
use modcheck_harness::{HarnessError, ReportFormat, RunConfig, Suite};

/// Load a server module and check its exported ABI.
#[derive(Debug, Parser)]
#[command(name = "harness", version)]
#[command(about = "Conformance harness for dynamically loaded server modules")]
struct Cli {
    /// Path to the module (shared library) under test.
    module: PathBuf,
    /// Delay between loading the module and the first call, in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    settle_ms: u64,
    /// Scenario suite to run.
    #[arg(long, value_enum, default_value_t = Suite::Canonical)]
    suite: Suite,
    /// Write a structured JSONL log to this path.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Write a run report to this path.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
    /// Format of the run report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
    report_format: ReportFormat,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig {
            module: self.module,
            settle: Duration::from_millis(self.settle_ms),
            suite: self.suite,
            log: self.log,
            report: self.report,
            report_format: self.report_format,
        }
    }
}

fn fail(err: &HarnessError) -> ExitCode {
    match err {
        HarnessError::Usage(usage) => eprint!("{usage}"),
        other => eprintln!("error: {other}"),
    }
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(err) if !err.use_stderr() => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => return fail(&HarnessError::Usage(err.to_string())),
    };

    let finished = match modcheck_harness::run(&cli.into_config()) {
        Ok(finished) => finished,
        Err(err) => return fail(&err),
    };
    let code = finished.summary().exit_code();

    // Unloading on Windows runs the module runtime's teardown, which can
    // replace the process exit status. Exit with the module still mapped.
    if cfg!(windows) {
        finished.leak();
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        process::exit(i32::from(code));
    }

    finished.close();
    ExitCode::from(code)
}
