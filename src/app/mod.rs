macro_rules! lock {
    ($name: expr) => {
        match $name.lock() {
            Ok(locked) => locked,
            Err(poisoned) => poisoned.into_inner(),
        }
    };
}

pub mod assert;
pub mod error;
pub(crate) mod executor;
pub mod hooks;
pub mod registry;
pub mod result;
pub(crate) mod scheduler;
pub mod selector;

use crate::app::error::{HookErrors, RunError};
use crate::app::registry::Registry;
use crate::app::scheduler::Scheduler;
use crate::configuration::RunConfig;
use crate::reporter::{Report, Reporter};
use std::time::Instant;

pub use crate::app::scheduler::Mode;

/// A registry of declared tests bound to the configuration it runs with.
pub struct App {
    registry: Registry,
    config: RunConfig,
}

impl App {
    pub fn new(registry: Registry, config: RunConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Selects, schedules and reports one run.
    ///
    /// Only an invalid configuration or an invalid selection aborts the run;
    /// every other problem ends up as a failed result or a collected hook error.
    pub async fn run(&self) -> Result<Report, RunError> {
        self.config.validate()?;
        let selected = selector::select(self.registry.tests())?;
        let mode = Mode::from(&self.config);
        info!(
            "Starting {} run of {} test(s) from {} suite(s)",
            mode,
            selected.len(),
            self.registry.suites().len()
        );

        let errors = HookErrors::default();
        let started = Instant::now();
        let results = Scheduler::new(&self.registry, &self.config, &errors)
            .run(&selected)
            .await;
        let elapsed = started.elapsed();

        if !errors.is_empty() {
            warn!("{} hook error(s) were ignored during the run", errors.len());
        }
        let report = Reporter::new(&self.config)
            .with_hook_errors(errors.into_inner())
            .build(&results, elapsed);
        if self.config.verbose {
            info!(
                "Finished in {} ms: {} passed, {} failed",
                elapsed.as_millis(),
                report.summary.passed,
                report.summary.failed
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::app::assert::expect;
    use crate::app::error::TestError;
    use crate::app::hooks::{async_fn, sync_fn};
    use crate::app::registry::TestOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn quick(config: RunConfig) -> RunConfig {
        RunConfig {
            retry_delay: Duration::from_millis(5),
            verbose: false,
            ..config
        }
    }

    fn math_and_io() -> Registry {
        let mut registry = Registry::new();
        registry
            .describe("Math", |s| {
                s.it("adds", sync_fn(|| expect(1 + 1).to_equal(2)))
            })
            .unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        registry
            .describe("IO", |s| {
                s.it_with(
                    "reads after a hiccup",
                    async_fn(move || {
                        let calls = Arc::clone(&calls);
                        async move {
                            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                                Err(TestError::msg("connection reset"))
                            } else {
                                Ok(())
                            }
                        }
                    }),
                    TestOptions::default().retries(1),
                )
            })
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_end_to_end_two_suites() {
        let app = App::new(math_and_io(), quick(RunConfig::default()));
        let report = app.run().await.unwrap();

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.passed, 2);
        assert_eq!(report.summary.failed, 0);
        assert_eq!(report.suites.len(), 2);
        for suite in &report.suites {
            assert_eq!(suite.total, 1);
            assert_eq!(suite.passed, 1);
        }
        let io = report.results.iter().find(|r| r.suite == "IO").unwrap();
        assert_eq!(io.attempts, 2);
    }

    #[tokio::test]
    async fn test_end_to_end_in_parallel_mode() {
        let config = quick(RunConfig {
            parallel: true,
            ..RunConfig::default()
        });
        let report = App::new(math_and_io(), config).run().await.unwrap();

        assert_eq!(report.summary.passed, 2);
        assert_eq!(report.environment.mode, Mode::Parallel);
    }

    #[tokio::test]
    async fn test_only_narrows_the_total() {
        let mut registry = Registry::new();
        registry
            .describe("A", |s| {
                s.it("one", sync_fn(|| Ok(())))?;
                s.only("two", sync_fn(|| Ok(())))?;
                s.it("three", sync_fn(|| Ok(())))
            })
            .unwrap();
        registry
            .describe("B", |s| {
                s.only("four", sync_fn(|| Err(TestError::msg("focused failure"))))?;
                s.skip("five", sync_fn(|| Ok(())))
            })
            .unwrap();

        let config = quick(RunConfig {
            retries: 0,
            ..RunConfig::default()
        });
        let report = App::new(registry, config).run().await.unwrap();

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.failed, 1);
    }

    #[tokio::test]
    async fn test_panicking_body_does_not_abort_the_run() {
        let mut registry = Registry::new();
        registry
            .describe("Fixtures", |s| {
                s.it_with(
                    "unloaded",
                    async_fn(|| {
                        let loaded: Option<u8> = None;
                        let fixture = loaded.expect("fixture not loaded");
                        async move { expect(fixture).to_equal(1) }
                    }),
                    TestOptions::default().retries(0),
                )?;
                s.it("loaded", sync_fn(|| Ok(())))
            })
            .unwrap();

        let report = App::new(registry, quick(RunConfig::default()))
            .run()
            .await
            .unwrap();

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.passed, 1);
        assert_eq!(report.failed_tests[0].name, "unloaded");
    }

    #[tokio::test]
    async fn test_invalid_config_aborts_run() {
        let config = RunConfig {
            timeout: Duration::from_millis(0),
            ..RunConfig::default()
        };
        let result = App::new(math_and_io(), config).run().await;

        assert!(matches!(result, Err(RunError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_swallowed_hook_errors_reach_the_report() {
        let mut registry = Registry::new();
        registry.after_all(sync_fn(|| Err(TestError::msg("cleanup failed"))));
        registry
            .describe("A", |s| s.it("one", sync_fn(|| Ok(()))))
            .unwrap();

        let report = App::new(registry, quick(RunConfig::default()))
            .run()
            .await
            .unwrap();

        assert_eq!(report.summary.passed, 1);
        assert_eq!(report.hook_errors.len(), 1);
        assert_eq!(report.hook_errors[0].message, "cleanup failed");
    }
}
