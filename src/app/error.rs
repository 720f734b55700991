use crate::app::hooks::HookKind;
use crate::configuration::ConfigError;
use serde_derive::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::Location;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinError;

/// Error handed back by a test body or hook that did not complete cleanly.
///
/// Any [`std::error::Error`] converts into it, so bodies can use `?` on their
/// own fallible calls. Assertions build it with the caller's location attached.
#[derive(Debug, Clone, PartialEq)]
pub struct TestError {
    message: String,
    stack: Option<String>,
}

impl TestError {
    pub fn msg<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    #[track_caller]
    pub fn located<M: Into<String>>(message: M) -> Self {
        let location = Location::caller();
        Self {
            message: message.into(),
            stack: Some(format!(
                "at {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            )),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl<E> From<E> for TestError
where
    E: std::error::Error,
{
    fn from(err: E) -> Self {
        let mut causes = vec![];
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        Self {
            message: err.to_string(),
            stack: if causes.is_empty() {
                None
            } else {
                Some(causes.join("\n"))
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// The body returned an error, usually a failed expectation.
    Assertion,
    /// The attempt outlived its deadline.
    Timeout,
    /// A `before_each` or suite `before_all` hook failed.
    Hook,
    /// The body or a hook panicked.
    Panic,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Assertion => "assertion",
            FailureKind::Timeout => "timeout",
            FailureKind::Hook => "hook",
            FailureKind::Panic => "panic",
        };
        f.write_str(name)
    }
}

/// The recorded reason a test attempt failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl Failure {
    pub fn timeout(limit: Duration) -> Self {
        Self {
            kind: FailureKind::Timeout,
            message: format!("Timeout of {}ms exceeded", limit.as_millis()),
            stack: None,
        }
    }

    pub fn panicked(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_owned()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "unknown panic payload".to_owned()
        };
        Self {
            kind: FailureKind::Panic,
            message: format!("panicked: {}", message),
            stack: None,
        }
    }

    pub fn hook(kind: HookKind, cause: Failure) -> Self {
        Self {
            kind: FailureKind::Hook,
            message: format!("\"{}\" hook failed: {}", kind, cause.message),
            stack: cause.stack,
        }
    }

    pub(crate) fn from_join(err: JoinError) -> Self {
        if err.is_panic() {
            Self::panicked(err.into_panic())
        } else {
            Self {
                kind: FailureKind::Panic,
                message: format!("task did not complete: {}", err),
                stack: None,
            }
        }
    }
}

impl From<TestError> for Failure {
    fn from(err: TestError) -> Self {
        Self {
            kind: FailureKind::Assertion,
            message: err.message,
            stack: err.stack,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeclarationError {
    #[error("Test '{test}' must be declared inside a describe block")]
    NoActiveSuite { test: String },
}

/// The only errors that abort a run before any test executes.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
    #[error("Test '{test}' declares a zero timeout")]
    InvalidTest { test: String },
}

/// A hook failure that was logged and swallowed instead of failing a test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookError {
    pub hook: HookKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
    pub message: String,
}

/// Collects swallowed hook failures for one run. Safe to share between
/// concurrently running tests.
#[derive(Debug, Default)]
pub struct HookErrors {
    entries: Mutex<Vec<HookError>>,
}

impl HookErrors {
    pub fn record(&self, hook: HookKind, suite: Option<&str>, test: Option<&str>, failure: &Failure) {
        warn!(
            "\"{}\" hook of {} failed{}: {}",
            hook,
            suite.map_or_else(|| "global scope".to_owned(), |s| format!("suite '{}'", s)),
            test.map(|t| format!(" around '{}'", t)).unwrap_or_default(),
            failure.message
        );
        lock!(self.entries).push(HookError {
            hook,
            suite: suite.map(str::to_owned),
            test: test.map(str::to_owned),
            message: failure.message.clone(),
        });
    }

    pub fn len(&self) -> usize {
        lock!(self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_inner(self) -> Vec<HookError> {
        match self.entries.into_inner() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
