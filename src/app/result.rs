use crate::app::error::Failure;
use crate::app::registry::Test;
use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of one test's full lifecycle, retries included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub suite: String,
    pub name: String,
    pub passed: bool,
    #[serde(rename = "durationMs", with = "crate::reporter::serialize::duration_millis")]
    pub duration: Duration,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Failure>,
    pub timestamp: DateTime<Utc>,
}

impl TestResult {
    pub(crate) fn passed(
        test: &Test,
        attempts: u32,
        duration: Duration,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            suite: test.suite().to_owned(),
            name: test.name().to_owned(),
            passed: true,
            duration,
            attempts,
            error: None,
            timestamp,
        }
    }

    pub(crate) fn failed(
        test: &Test,
        failure: Failure,
        attempts: u32,
        duration: Duration,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            suite: test.suite().to_owned(),
            name: test.name().to_owned(),
            passed: false,
            duration,
            attempts,
            error: Some(failure),
            timestamp,
        }
    }

    pub fn key(&self) -> String {
        format!("{} > {}", self.suite, self.name)
    }
}
