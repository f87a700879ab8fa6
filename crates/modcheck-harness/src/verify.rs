//! Scenario results and their aggregation.

use serde::{Deserialize, Serialize};

/// Result of running a single scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario name, e.g. `Database lifecycle`.
    pub scenario: String,
    pub passed: bool,
    /// Why the scenario failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Wall-clock time spent in the scenario.
    pub duration_ms: u64,
    /// Exports whose call succeeded, in call order.
    #[serde(default)]
    pub steps: Vec<String>,
}

impl ScenarioResult {
    #[must_use]
    pub fn pass(scenario: impl Into<String>, steps: Vec<String>, duration_ms: u64) -> Self {
        Self {
            scenario: scenario.into(),
            passed: true,
            failure: None,
            duration_ms,
            steps,
        }
    }

    #[must_use]
    pub fn fail(
        scenario: impl Into<String>,
        failure: impl Into<String>,
        steps: Vec<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            scenario: scenario.into(),
            passed: false,
            failure: Some(failure.into()),
            duration_ms,
            steps,
        }
    }
}

/// Aggregate run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Scenarios run.
    pub total: usize,
    /// Scenarios passed.
    pub passed: usize,
    /// Scenarios failed.
    pub failed: usize,
    /// Individual results, in run order.
    pub results: Vec<ScenarioResult>,
}

impl RunSummary {
    /// Build a summary from a list of results.
    #[must_use]
    pub fn from_results(results: Vec<ScenarioResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let failed = total - passed;
        Self {
            total,
            passed,
            failed,
            results,
        }
    }

    /// Returns true if all scenarios passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Process exit code for this run: `0` only when every scenario passed.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::from(!self.all_passed())
    }

    /// `Tests passed: N/M`
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!("Tests passed: {}/{}", self.passed, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_and_exit_code() {
        let summary = RunSummary::from_results(vec![
            ScenarioResult::pass("Create-Server", vec!["CreateServerInstance".into()], 1),
            ScenarioResult::fail("Database lifecycle", "CreateDatabase: result = 201", vec![], 0),
            ScenarioResult::pass("Stop-Server", vec!["StopServerInstance".into()], 0),
        ]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_passed());
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(summary.summary_line(), "Tests passed: 2/3");
    }

    #[test]
    fn all_passing_run_exits_zero() {
        let summary =
            RunSummary::from_results(vec![ScenarioResult::pass("Stop-Server", vec![], 0)]);
        assert!(summary.all_passed());
        assert_eq!(summary.exit_code(), 0);
        assert_eq!(summary.summary_line(), "Tests passed: 1/1");
    }

    #[test]
    fn failure_is_omitted_from_json_when_passing() {
        let json = serde_json::to_value(ScenarioResult::pass("Create-Server", vec![], 2)).unwrap();
        assert!(json.get("failure").is_none());
        assert_eq!(json["duration_ms"], 2);
    }
}
