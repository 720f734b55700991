use crate::app::error::TestError;
use derivative::*;
use futures::future::BoxFuture;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

pub type RunFuture = BoxFuture<'static, Result<(), TestError>>;

/// Anything the executor can invoke: test bodies and hooks alike.
///
/// The returned future is spawned onto the runtime and raced against a
/// deadline. If the deadline wins, the executor stops waiting but the spawned
/// work is not preempted and may keep running in the background.
pub trait Runnable: Send + Sync {
    fn run(&self) -> RunFuture;
}

pub type Operation = Arc<dyn Runnable>;

/// A blocking body, executed on the blocking thread pool so that a deadline
/// can still be enforced around it.
///
/// A body that outlives its deadline keeps its pool thread until it returns,
/// and dropping the runtime waits for it. Binaries should end the process
/// with `std::process::exit` instead of returning from `main`.
pub struct SyncFn<F>(Arc<F>);

/// A body that suspends, written as a closure returning a future.
pub struct AsyncFn<F>(F);

pub fn sync_fn<F>(body: F) -> SyncFn<F>
where
    F: Fn() -> Result<(), TestError> + Send + Sync + 'static,
{
    SyncFn(Arc::new(body))
}

pub fn async_fn<F, Fut>(body: F) -> AsyncFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TestError>> + Send + 'static,
{
    AsyncFn(body)
}

impl<F> Runnable for SyncFn<F>
where
    F: Fn() -> Result<(), TestError> + Send + Sync + 'static,
{
    fn run(&self) -> RunFuture {
        let body = Arc::clone(&self.0);
        Box::pin(async move {
            match tokio::task::spawn_blocking(move || body()).await {
                Ok(outcome) => outcome,
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => Err(TestError::msg(format!("blocking task did not complete: {}", err))),
            }
        })
    }
}

impl<F, Fut> Runnable for AsyncFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TestError>> + Send + 'static,
{
    fn run(&self) -> RunFuture {
        Box::pin((self.0)())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookKind {
    BeforeAll,
    AfterAll,
    BeforeEach,
    AfterEach,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::BeforeAll => "beforeAll",
            HookKind::AfterAll => "afterAll",
            HookKind::BeforeEach => "beforeEach",
            HookKind::AfterEach => "afterEach",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Default, Derivative)]
#[derivative(Debug)]
pub struct HookSet {
    #[derivative(Debug(format_with = "count_hooks"))]
    before_all: Vec<Operation>,
    #[derivative(Debug(format_with = "count_hooks"))]
    after_all: Vec<Operation>,
    #[derivative(Debug(format_with = "count_hooks"))]
    before_each: Vec<Operation>,
    #[derivative(Debug(format_with = "count_hooks"))]
    after_each: Vec<Operation>,
}

#[allow(clippy::ptr_arg)]
fn count_hooks(hooks: &Vec<Operation>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} hook(s)", hooks.len())
}

impl HookSet {
    pub fn push(&mut self, kind: HookKind, hook: Operation) {
        self.list_mut(kind).push(hook);
    }

    pub fn get(&self, kind: HookKind) -> &[Operation] {
        match kind {
            HookKind::BeforeAll => &self.before_all,
            HookKind::AfterAll => &self.after_all,
            HookKind::BeforeEach => &self.before_each,
            HookKind::AfterEach => &self.after_each,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.before_all.is_empty()
            && self.after_all.is_empty()
            && self.before_each.is_empty()
            && self.after_each.is_empty()
    }

    fn list_mut(&mut self, kind: HookKind) -> &mut Vec<Operation> {
        match kind {
            HookKind::BeforeAll => &mut self.before_all,
            HookKind::AfterAll => &mut self.after_all,
            HookKind::BeforeEach => &mut self.before_each,
            HookKind::AfterEach => &mut self.after_each,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_sync_fn_runs_on_blocking_pool() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let body = sync_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(body.run().await.is_ok());
        assert!(body.run().await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_async_fn_propagates_error() {
        let body = async_fn(|| async { Err::<(), _>(TestError::msg("nope")) });

        assert_eq!(body.run().await, Err(TestError::msg("nope")));
    }

    #[test]
    fn test_hook_set_keeps_declaration_order_per_kind() {
        let mut hooks = HookSet::default();
        hooks.push(HookKind::BeforeEach, Arc::new(sync_fn(|| Ok(()))));
        hooks.push(HookKind::BeforeEach, Arc::new(sync_fn(|| Err(TestError::msg("x")))));

        assert_eq!(hooks.get(HookKind::BeforeEach).len(), 2);
        assert!(hooks.get(HookKind::AfterEach).is_empty());
        assert!(!hooks.is_empty());
        assert!(format!("{:?}", hooks).contains("before_each: 2 hook(s)"));
    }
}
