use crate::app::error::{Failure, HookErrors};
use crate::app::hooks::{HookKind, HookSet, Operation};
use crate::app::registry::{Registry, Suite, Test};
use crate::app::result::TestResult;
use crate::configuration::RunConfig;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};

/// Spawns `operation` and waits for it at most `limit`.
///
/// `run` itself is called inside the spawned task, so a panic raised while
/// building the future is caught by the task boundary too. When the deadline
/// fires first the task handle is dropped: the work is detached, not
/// cancelled, and a body that never yields keeps its thread busy.
pub(crate) async fn invoke(operation: &Operation, limit: Duration) -> Result<(), Failure> {
    let operation = Arc::clone(operation);
    let task = tokio::spawn(async move { operation.run().await });
    match timeout(limit, task).await {
        Ok(Ok(Ok(()))) => Ok(()),
        Ok(Ok(Err(err))) => Err(Failure::from(err)),
        Ok(Err(join)) => Err(Failure::from_join(join)),
        Err(_) => Err(Failure::timeout(limit)),
    }
}

/// Runs single tests through `beforeEach`, the guarded body, `afterEach`
/// and the retry loop.
pub(crate) struct Executor<'a> {
    registry: &'a Registry,
    config: &'a RunConfig,
    errors: &'a HookErrors,
}

impl<'a> Executor<'a> {
    pub fn new(registry: &'a Registry, config: &'a RunConfig, errors: &'a HookErrors) -> Self {
        Self {
            registry,
            config,
            errors,
        }
    }

    pub async fn execute(&self, test: &Test) -> TestResult {
        let limit = test.timeout_or(self.config.timeout);
        let max_attempts = test.retries_or(self.config.retries).saturating_add(1);
        let hooks = self.registry.suite(test.suite()).map(Suite::hooks);
        let timestamp = Utc::now();
        let started = Instant::now();
        let mut attempt = 1;
        loop {
            debug!(
                "Running '{}', attempt {}/{}",
                test.key(),
                attempt,
                max_attempts
            );
            match self.attempt(test, hooks, limit).await {
                Ok(()) => return TestResult::passed(test, attempt, started.elapsed(), timestamp),
                Err(failure) if attempt < max_attempts => {
                    warn!(
                        "'{}' failed on attempt {}/{}: {}, retrying in {:?}",
                        test.key(),
                        attempt,
                        max_attempts,
                        failure,
                        self.config.retry_delay
                    );
                    sleep(self.config.retry_delay).await;
                    attempt += 1;
                }
                Err(failure) => {
                    return TestResult::failed(
                        test,
                        failure,
                        attempt,
                        started.elapsed(),
                        timestamp,
                    )
                }
            }
        }
    }

    async fn attempt(
        &self,
        test: &Test,
        hooks: Option<&HookSet>,
        limit: Duration,
    ) -> Result<(), Failure> {
        let globals = self.registry.globals();
        let mut outcome = self
            .setup(HookKind::BeforeEach, globals.get(HookKind::BeforeEach))
            .await;
        if let Some(hooks) = hooks.filter(|_| outcome.is_ok()) {
            outcome = self
                .setup(HookKind::BeforeEach, hooks.get(HookKind::BeforeEach))
                .await;
        }
        if outcome.is_ok() {
            outcome = invoke(test.body(), limit).await;
        }

        let key = test.key();
        if let Some(hooks) = hooks {
            self.teardown(
                HookKind::AfterEach,
                hooks.get(HookKind::AfterEach),
                Some(test.suite()),
                Some(&key),
            )
            .await;
        }
        self.teardown(
            HookKind::AfterEach,
            globals.get(HookKind::AfterEach),
            None,
            Some(&key),
        )
        .await;
        outcome
    }

    /// Runs setup hooks in order and stops at the first failure.
    pub async fn setup(&self, kind: HookKind, hooks: &[Operation]) -> Result<(), Failure> {
        for hook in hooks {
            invoke(hook, self.config.timeout)
                .await
                .map_err(|failure| Failure::hook(kind, failure))?;
        }
        Ok(())
    }

    /// Runs every teardown hook; failures are collected, never returned.
    pub async fn teardown(
        &self,
        kind: HookKind,
        hooks: &[Operation],
        suite: Option<&str>,
        test: Option<&str>,
    ) {
        for hook in hooks {
            if let Err(failure) = invoke(hook, self.config.timeout).await {
                self.errors.record(kind, suite, test, &failure);
            }
        }
    }
}
