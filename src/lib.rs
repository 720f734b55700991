//! A small test orchestration engine.
//!
//! Tests are declared programmatically into a [`Registry`], then an [`App`]
//! selects them (`only`/`skip`), runs them sequentially or concurrently with
//! hooks, per-attempt deadlines and retries, and folds the results into a
//! [`Report`] that renders as JSON, JUnit XML or a console summary.
//!
//! ```no_run
//! use crucible::{expect, sync_fn, App, Registry, RunConfig};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = Registry::new();
//! registry.describe("Math", |s| {
//!     s.it("adds", sync_fn(|| expect(1 + 1).to_equal(2)))
//! })?;
//! let report = App::new(registry, RunConfig::default()).run().await?;
//! println!("{}", report.console());
//! # Ok(())
//! # }
//! ```

extern crate chrono;
extern crate derivative;
extern crate serde_derive;

#[macro_use]
extern crate log;

pub mod app;
pub mod configuration;
pub mod reporter;
pub mod time;

pub use self::app::assert::{expect, Contains, Truthy};
pub use self::app::error::{DeclarationError, Failure, FailureKind, RunError, TestError};
pub use self::app::hooks::{async_fn, sync_fn, HookKind, Runnable};
pub use self::app::registry::{Registry, Suite, Test, TestOptions};
pub use self::app::result::TestResult;
pub use self::app::{App, Mode};
pub use self::configuration::RunConfig;
pub use self::reporter::{Report, Reporter};
