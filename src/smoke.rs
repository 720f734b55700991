use crucible::{async_fn, expect, sync_fn, DeclarationError, Registry, TestError, TestOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Suites bundled with the binary, exercising the matchers, the hook
/// lifecycle and the retry loop of the engine.
pub fn registry() -> Result<Registry, DeclarationError> {
    let mut registry = Registry::new();

    let started = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&started);
    registry.before_each(sync_fn(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));

    registry.describe("Assertions", |s| {
        s.it("compares values", sync_fn(|| expect(2 + 2).to_equal(4)))?;
        s.it(
            "finds substrings",
            sync_fn(|| expect("crucible").to_contain("cible")),
        )?;
        s.it("treats empty text as falsy", sync_fn(|| expect("").to_be_falsy()))?;
        s.it(
            "detects failing calls",
            sync_fn(|| expect(|| "NaN".parse::<u32>()).to_throw()),
        )
    })?;

    let fixtures = Arc::new(AtomicUsize::new(0));
    registry.describe("Lifecycle", |s| {
        let loaded = Arc::clone(&fixtures);
        s.before_all(sync_fn(move || {
            loaded.store(3, Ordering::SeqCst);
            Ok(())
        }));
        let seen = Arc::clone(&fixtures);
        s.it(
            "sees fixtures from beforeAll",
            sync_fn(move || expect(seen.load(Ordering::SeqCst)).to_equal(3)),
        )?;
        let hooks = Arc::clone(&started);
        s.it(
            "runs global beforeEach first",
            sync_fn(move || expect(hooks.load(Ordering::SeqCst)).to_not_equal(0)),
        )
    })?;

    let calls = Arc::new(AtomicUsize::new(0));
    registry.describe("Timing", |s| {
        s.it_with(
            "waits without blocking",
            async_fn(|| async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                expect(true).to_be_truthy()
            }),
            TestOptions::default().timeout(Duration::from_secs(1)),
        )?;
        s.it_with(
            "recovers on retry",
            async_fn(move || {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        return Err(TestError::msg("cold start"));
                    }
                    Ok(())
                }
            }),
            TestOptions::default().retries(1),
        )
    })?;

    Ok(registry)
}
