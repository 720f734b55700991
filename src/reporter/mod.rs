pub mod console;
pub mod junit;
pub mod serialize;

use crate::app::error::HookError;
use crate::app::result::TestResult;
use crate::app::Mode;
use crate::configuration::constants::cargo_env::{CARGO_PKG_NAME, CARGO_PKG_VERSION};
use crate::configuration::constants::common::DEFAULT_SLOW_TESTS;
use crate::configuration::RunConfig;
use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub success_rate: u32,
    #[serde(rename = "durationMs", with = "crate::reporter::serialize::duration_millis")]
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteSummary {
    pub name: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub success_rate: u32,
    #[serde(rename = "durationMs", with = "crate::reporter::serialize::duration_millis")]
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlowTest {
    pub suite: String,
    pub name: String,
    #[serde(rename = "durationMs", with = "crate::reporter::serialize::duration_millis")]
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedTest {
    pub suite: String,
    pub name: String,
    pub error: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub name: String,
    pub version: String,
    pub os: String,
    pub arch: String,
    pub run_id: uuid::Uuid,
    pub mode: Mode,
    pub generated_at: DateTime<Utc>,
}

impl Environment {
    fn current(mode: Mode) -> Self {
        Self {
            name: CARGO_PKG_NAME.to_owned(),
            version: CARGO_PKG_VERSION.to_owned(),
            os: std::env::consts::OS.to_owned(),
            arch: std::env::consts::ARCH.to_owned(),
            run_id: uuid::Uuid::new_v4(),
            mode,
            generated_at: Utc::now(),
        }
    }
}

/// Everything known about one finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub summary: Summary,
    pub suites: Vec<SuiteSummary>,
    pub slow_tests: Vec<SlowTest>,
    pub failed_tests: Vec<FailedTest>,
    pub results: Vec<TestResult>,
    pub hook_errors: Vec<HookError>,
    pub environment: Environment,
}

impl Report {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_junit_xml(&self) -> Result<String, quick_junit::SerializeError> {
        junit::document(self).to_string()
    }

    /// Human readable summary, meant for a terminal.
    pub fn console(&self) -> console::Console<'_> {
        console::Console::new(self)
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }
}

/// Builds [`Report`]s out of raw results.
#[derive(Debug, Clone)]
pub struct Reporter {
    slow_limit: usize,
    mode: Mode,
    hook_errors: Vec<HookError>,
}

impl Default for Reporter {
    fn default() -> Self {
        Self {
            slow_limit: DEFAULT_SLOW_TESTS,
            mode: Mode::Sequential,
            hook_errors: vec![],
        }
    }
}

impl Reporter {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            slow_limit: config.slow_tests,
            mode: Mode::from(config),
            hook_errors: vec![],
        }
    }

    pub fn with_hook_errors(mut self, hook_errors: Vec<HookError>) -> Self {
        self.hook_errors = hook_errors;
        self
    }

    /// `duration` is the wall clock time of the whole run, not the sum of the
    /// results.
    pub fn build(&self, results: &[TestResult], duration: Duration) -> Report {
        let passed = results.iter().filter(|r| r.passed).count();
        let summary = Summary {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            success_rate: success_rate(passed, results.len()),
            duration,
        };
        Report {
            summary,
            suites: rollup(results),
            slow_tests: self.slowest(results),
            failed_tests: results
                .iter()
                .filter(|r| !r.passed)
                .map(|r| FailedTest {
                    suite: r.suite.clone(),
                    name: r.name.clone(),
                    error: r
                        .error
                        .as_ref()
                        .map(|e| e.message.clone())
                        .unwrap_or_default(),
                    attempts: r.attempts,
                })
                .collect(),
            results: results.to_vec(),
            hook_errors: self.hook_errors.clone(),
            environment: Environment::current(self.mode),
        }
    }

    fn slowest(&self, results: &[TestResult]) -> Vec<SlowTest> {
        let mut ranked: Vec<&TestResult> = results.iter().collect();
        ranked.sort_by(|a, b| b.duration.cmp(&a.duration));
        ranked
            .into_iter()
            .take(self.slow_limit)
            .map(|r| SlowTest {
                suite: r.suite.clone(),
                name: r.name.clone(),
                duration: r.duration,
            })
            .collect()
    }
}

fn success_rate(passed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (passed as f64 / total as f64 * 100.0).round() as u32
}

/// Groups results by suite name, in the order suites first appear.
fn rollup(results: &[TestResult]) -> Vec<SuiteSummary> {
    let mut suites: Vec<SuiteSummary> = vec![];
    let mut index: HashMap<&str, usize> = HashMap::new();
    for result in results {
        let position = *index.entry(result.suite.as_str()).or_insert_with(|| {
            suites.push(SuiteSummary {
                name: result.suite.clone(),
                total: 0,
                passed: 0,
                failed: 0,
                success_rate: 0,
                duration: Duration::from_millis(0),
            });
            suites.len() - 1
        });
        let suite = &mut suites[position];
        suite.total += 1;
        if result.passed {
            suite.passed += 1;
        } else {
            suite.failed += 1;
        }
        suite.duration += result.duration;
    }
    for suite in &mut suites {
        suite.success_rate = success_rate(suite.passed, suite.total);
    }
    suites
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::app::error::{Failure, FailureKind};
    use chrono::TimeZone;

    pub(crate) fn result(suite: &str, name: &str, millis: u64, failure: Option<&str>) -> TestResult {
        TestResult {
            suite: suite.to_owned(),
            name: name.to_owned(),
            passed: failure.is_none(),
            duration: Duration::from_millis(millis),
            attempts: if failure.is_some() { 3 } else { 1 },
            error: failure.map(|message| Failure {
                kind: FailureKind::Assertion,
                message: message.to_owned(),
                stack: Some("at src/portfolio.rs:10:5".to_owned()),
            }),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    pub(crate) fn sample() -> Vec<TestResult> {
        vec![
            result("Math", "adds", 12, None),
            result("IO", "reads", 40, Some("file missing")),
            result("Math", "divides", 3, None),
            result("IO", "writes", 25, None),
        ]
    }

    #[test]
    fn test_summary_counts_and_rate() {
        let report = Reporter::default().build(&sample(), Duration::from_millis(90));

        assert_eq!(report.summary.total, 4);
        assert_eq!(report.summary.passed, 3);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.success_rate, 75);
        assert_eq!(report.summary.duration, Duration::from_millis(90));
        assert!(report.has_failures());
    }

    #[test]
    fn test_empty_run_has_zero_success_rate() {
        let report = Reporter::default().build(&[], Duration::from_millis(0));

        assert_eq!(report.summary.total, 0);
        assert_eq!(report.summary.success_rate, 0);
        assert!(report.suites.is_empty());
        assert!(!report.has_failures());
    }

    #[test]
    fn test_success_rate_rounds() {
        assert_eq!(success_rate(2, 3), 67);
        assert_eq!(success_rate(1, 3), 33);
        assert_eq!(success_rate(1, 8), 13);
    }

    #[test]
    fn test_suites_roll_up_in_first_seen_order() {
        let report = Reporter::default().build(&sample(), Duration::from_millis(90));

        assert_eq!(report.suites.len(), 2);
        let math = &report.suites[0];
        assert_eq!(math.name, "Math");
        assert_eq!((math.total, math.passed, math.failed), (2, 2, 0));
        assert_eq!(math.duration, Duration::from_millis(15));
        assert_eq!(math.success_rate, 100);
        let io = &report.suites[1];
        assert_eq!((io.total, io.passed, io.failed), (2, 1, 1));
        assert_eq!(io.success_rate, 50);
    }

    #[test]
    fn test_slow_tests_are_ranked_and_limited() {
        let config = RunConfig {
            slow_tests: 2,
            ..RunConfig::default()
        };
        let report = Reporter::new(&config).build(&sample(), Duration::from_millis(90));

        let names: Vec<&str> = report.slow_tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["reads", "writes"]);
    }

    #[test]
    fn test_failed_tests_carry_message_and_attempts() {
        let report = Reporter::default().build(&sample(), Duration::from_millis(90));

        assert_eq!(
            report.failed_tests,
            vec![FailedTest {
                suite: "IO".to_owned(),
                name: "reads".to_owned(),
                error: "file missing".to_owned(),
                attempts: 3,
            }]
        );
    }

    #[test]
    fn test_build_is_idempotent() {
        let reporter = Reporter::default();
        let results = sample();
        let first = reporter.build(&results, Duration::from_millis(90));
        let second = reporter.build(&results, Duration::from_millis(90));

        assert_eq!(first.summary, second.summary);
        assert_eq!(first.suites, second.suites);
        assert_eq!(first.slow_tests, second.slow_tests);
    }

    #[test]
    fn test_json_round_trip_keeps_summary() {
        let report = Reporter::default().build(&sample(), Duration::from_millis(90));
        let json = report.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["total"], 4);
        assert_eq!(value["summary"]["passed"], 3);
        assert_eq!(value["summary"]["failed"], 1);
        assert_eq!(value["summary"]["successRate"], 75);
        assert_eq!(value["environment"]["mode"], "sequential");

        let parsed = Report::from_json(&json).unwrap();
        assert_eq!(parsed.summary.total, report.summary.total);
        assert_eq!(parsed.summary.passed, report.summary.passed);
        assert_eq!(parsed.summary.failed, report.summary.failed);
        assert_eq!(parsed.results[1].error, report.results[1].error);
    }

    #[test]
    fn test_from_json_rejects_overflowing_duration() {
        let report = Reporter::default().build(&sample(), Duration::from_millis(1));
        let json = report.to_json().unwrap();
        assert!(json.contains("\"durationMs\": 1.0"));

        let tampered = json.replacen("\"durationMs\": 1.0", "\"durationMs\": 1e30", 1);
        assert!(Report::from_json(&tampered).is_err());
    }
}
