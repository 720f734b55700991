use crate::app::error::{Failure, HookErrors};
use crate::app::executor::Executor;
use crate::app::hooks::{HookKind, HookSet};
use crate::app::registry::{Registry, Suite, Test};
use crate::app::result::TestResult;
use crate::configuration::RunConfig;
use chrono::Utc;
use futures::future::join_all;
use log::Level;
use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Sequential,
    Parallel,
}

impl From<&RunConfig> for Mode {
    fn from(config: &RunConfig) -> Self {
        if config.parallel {
            Mode::Parallel
        } else {
            Mode::Sequential
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Sequential => f.write_str("sequential"),
            Mode::Parallel => f.write_str("parallel"),
        }
    }
}

/// Selected tests of one suite, in selection order.
struct Group<'t> {
    suite: &'t str,
    tests: Vec<&'t Test>,
}

/// Groups tests by suite, keeping the order in which suites are first seen.
fn group<'t>(selected: &[&'t Test]) -> Vec<Group<'t>> {
    let mut groups: Vec<Group<'t>> = vec![];
    let mut index: HashMap<&str, usize> = HashMap::new();
    for &test in selected {
        let position = *index.entry(test.suite()).or_insert_with(|| {
            groups.push(Group {
                suite: test.suite(),
                tests: vec![],
            });
            groups.len() - 1
        });
        groups[position].tests.push(test);
    }
    groups
}

pub(crate) struct Scheduler<'a> {
    registry: &'a Registry,
    config: &'a RunConfig,
    errors: &'a HookErrors,
    executor: Executor<'a>,
}

impl<'a> Scheduler<'a> {
    pub fn new(registry: &'a Registry, config: &'a RunConfig, errors: &'a HookErrors) -> Self {
        Self {
            registry,
            config,
            errors,
            executor: Executor::new(registry, config, errors),
        }
    }

    /// Runs the selected tests and returns their results in selection order.
    pub async fn run(&self, selected: &[&Test]) -> Vec<TestResult> {
        let globals = self.registry.globals();
        if let Err(failure) = self
            .executor
            .setup(HookKind::BeforeAll, globals.get(HookKind::BeforeAll))
            .await
        {
            self.errors.record(HookKind::BeforeAll, None, None, &failure);
        }

        let results = match Mode::from(self.config) {
            Mode::Sequential => self.sequential(selected).await,
            Mode::Parallel => self.parallel(selected).await,
        };

        self.executor
            .teardown(
                HookKind::AfterAll,
                globals.get(HookKind::AfterAll),
                None,
                None,
            )
            .await;
        results
    }

    async fn sequential(&self, selected: &[&Test]) -> Vec<TestResult> {
        let mut results: Vec<TestResult> = Vec::with_capacity(selected.len());
        for group in group(selected) {
            let hooks = self.hooks(group.suite);
            let setup = self.suite_setup(group.suite, hooks).await;
            for (position, test) in group.tests.iter().enumerate() {
                if self.config.bail && results.iter().any(|r| !r.passed) {
                    info!(
                        "Bailing out of suite '{}', {} test(s) not run",
                        group.suite,
                        group.tests.len() - position
                    );
                    break;
                }
                let result = self.run_test(test, &setup).await;
                self.log_result(&result);
                results.push(result);
            }
            self.suite_teardown(group.suite, hooks).await;
        }
        results
    }

    async fn parallel(&self, selected: &[&Test]) -> Vec<TestResult> {
        let groups = group(selected);
        let mut setups: HashMap<&str, Result<(), Failure>> = HashMap::new();
        for group in &groups {
            let setup = self.suite_setup(group.suite, self.hooks(group.suite)).await;
            setups.insert(group.suite, setup);
        }

        let setups = &setups;
        let results = join_all(selected.iter().map(|&test| async move {
            let setup = setups.get(test.suite()).cloned().unwrap_or(Ok(()));
            let result = self.run_test(test, &setup).await;
            self.log_result(&result);
            result
        }))
        .await;

        for group in &groups {
            self.suite_teardown(group.suite, self.hooks(group.suite)).await;
        }
        results
    }

    async fn run_test(&self, test: &Test, setup: &Result<(), Failure>) -> TestResult {
        match setup {
            Ok(()) => self.executor.execute(test).await,
            Err(failure) => {
                TestResult::failed(test, failure.clone(), 1, Duration::from_millis(0), Utc::now())
            }
        }
    }

    fn hooks(&self, suite: &str) -> Option<&'a HookSet> {
        self.registry.suite(suite).map(Suite::hooks)
    }

    async fn suite_setup(&self, suite: &str, hooks: Option<&HookSet>) -> Result<(), Failure> {
        let hooks = match hooks {
            Some(hooks) => hooks,
            None => return Ok(()),
        };
        debug!("Running \"beforeAll\" hooks of suite '{}'", suite);
        self.executor
            .setup(HookKind::BeforeAll, hooks.get(HookKind::BeforeAll))
            .await
            .map_err(|failure| {
                self.errors
                    .record(HookKind::BeforeAll, Some(suite), None, &failure);
                failure
            })
    }

    async fn suite_teardown(&self, suite: &str, hooks: Option<&HookSet>) {
        if let Some(hooks) = hooks {
            debug!("Running \"afterAll\" hooks of suite '{}'", suite);
            self.executor
                .teardown(
                    HookKind::AfterAll,
                    hooks.get(HookKind::AfterAll),
                    Some(suite),
                    None,
                )
                .await;
        }
    }

    fn log_result(&self, result: &TestResult) {
        let level = if self.config.verbose {
            Level::Info
        } else {
            Level::Debug
        };
        match &result.error {
            None => log!(
                level,
                "PASS {} ({} attempt(s), {} ms)",
                result.key(),
                result.attempts,
                result.duration.as_millis()
            ),
            Some(failure) => log!(
                level,
                "FAIL {} ({} attempt(s), {} ms): {}",
                result.key(),
                result.attempts,
                result.duration.as_millis(),
                failure
            ),
        }
    }
}
