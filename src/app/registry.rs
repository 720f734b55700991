use crate::app::error::DeclarationError;
use crate::app::hooks::{HookKind, HookSet, Operation, Runnable};
use derivative::*;
use std::sync::Arc;
use std::time::Duration;

/// Per-test overrides. Unset timeout and retries fall back to the run
/// configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestOptions {
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
    pub skip: bool,
    pub only: bool,
}

impl TestOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn only(mut self) -> Self {
        self.only = true;
        self
    }
}

#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Test {
    suite: String,
    name: String,
    #[derivative(Debug = "ignore")]
    body: Operation,
    options: TestOptions,
    sequence: usize,
}

impl Test {
    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique identity of the test within a registry.
    pub fn key(&self) -> String {
        format!("{} > {}", self.suite, self.name)
    }

    pub fn body(&self) -> &Operation {
        &self.body
    }

    pub fn options(&self) -> &TestOptions {
        &self.options
    }

    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.options.timeout.unwrap_or(default)
    }

    pub fn retries_or(&self, default: u32) -> u32 {
        self.options.retries.unwrap_or(default)
    }
}

#[derive(Clone, Debug)]
pub struct Suite {
    name: String,
    parent: Option<String>,
    tests: Vec<Test>,
    hooks: HookSet,
}

impl Suite {
    fn new(name: String, parent: Option<String>) -> Self {
        Self {
            name,
            parent,
            tests: vec![],
            hooks: HookSet::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The suite whose `describe` block was active when this one was declared.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    pub fn hooks(&self) -> &HookSet {
        &self.hooks
    }
}

/// Declared suites, tests and hooks.
///
/// The suite that receives declarations is tracked by a stack owned by the
/// registry itself, so independent registries never see each other's
/// declarations.
#[derive(Debug, Default)]
pub struct Registry {
    suites: Vec<Suite>,
    stack: Vec<String>,
    globals: HookSet,
    sequence: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a suite and runs `body` with it as the active suite.
    ///
    /// Declaring a name that already exists replaces the earlier suite record
    /// together with its tests and hooks.
    pub fn describe<N, F>(&mut self, name: N, body: F) -> Result<(), DeclarationError>
    where
        N: Into<String>,
        F: FnOnce(&mut Registry) -> Result<(), DeclarationError>,
    {
        let name = name.into();
        let parent = self.stack.last().cloned();
        if let Some(position) = self.suites.iter().position(|s| s.name == name) {
            debug!("Suite '{}' declared again, replacing the previous declaration", name);
            self.suites.remove(position);
        }
        self.suites.push(Suite::new(name.clone(), parent));
        self.stack.push(name);
        let declared = body(self);
        self.stack.pop();
        declared
    }

    pub fn it<N, R>(&mut self, name: N, body: R) -> Result<(), DeclarationError>
    where
        N: Into<String>,
        R: Runnable + 'static,
    {
        self.it_with(name, body, TestOptions::default())
    }

    pub fn test<N, R>(&mut self, name: N, body: R) -> Result<(), DeclarationError>
    where
        N: Into<String>,
        R: Runnable + 'static,
    {
        self.it(name, body)
    }

    pub fn skip<N, R>(&mut self, name: N, body: R) -> Result<(), DeclarationError>
    where
        N: Into<String>,
        R: Runnable + 'static,
    {
        self.it_with(name, body, TestOptions::default().skip())
    }

    pub fn only<N, R>(&mut self, name: N, body: R) -> Result<(), DeclarationError>
    where
        N: Into<String>,
        R: Runnable + 'static,
    {
        self.it_with(name, body, TestOptions::default().only())
    }

    /// Declares a test with explicit options. A name repeated within one
    /// suite is kept as a second test under the same key and logged.
    pub fn it_with<N, R>(
        &mut self,
        name: N,
        body: R,
        options: TestOptions,
    ) -> Result<(), DeclarationError>
    where
        N: Into<String>,
        R: Runnable + 'static,
    {
        let name = name.into();
        let sequence = self.sequence;
        let suite = match self.active_mut() {
            Some(suite) => suite,
            None => return Err(DeclarationError::NoActiveSuite { test: name }),
        };
        if suite.tests.iter().any(|t| t.name == name) {
            warn!(
                "Test '{} > {}' is declared more than once, both share the same key",
                suite.name, name
            );
        }
        trace!("Declared test '{} > {}' with {:?}", suite.name, name, options);
        let test = Test {
            suite: suite.name.clone(),
            name,
            body: Arc::new(body),
            options,
            sequence,
        };
        suite.tests.push(test);
        self.sequence += 1;
        Ok(())
    }

    pub fn before_all<R: Runnable + 'static>(&mut self, hook: R) {
        self.hook(HookKind::BeforeAll, hook)
    }

    pub fn after_all<R: Runnable + 'static>(&mut self, hook: R) {
        self.hook(HookKind::AfterAll, hook)
    }

    pub fn before_each<R: Runnable + 'static>(&mut self, hook: R) {
        self.hook(HookKind::BeforeEach, hook)
    }

    pub fn after_each<R: Runnable + 'static>(&mut self, hook: R) {
        self.hook(HookKind::AfterEach, hook)
    }

    /// Attaches a hook to the active suite, or to the global set outside of
    /// any `describe` block.
    pub fn hook<R: Runnable + 'static>(&mut self, kind: HookKind, hook: R) {
        let hook: Operation = Arc::new(hook);
        match self.active_mut() {
            Some(suite) => suite.hooks.push(kind, hook),
            None => self.globals.push(kind, hook),
        }
    }

    pub fn suites(&self) -> &[Suite] {
        &self.suites
    }

    pub fn suite(&self, name: &str) -> Option<&Suite> {
        self.suites.iter().find(|s| s.name == name)
    }

    pub fn globals(&self) -> &HookSet {
        &self.globals
    }

    pub fn active_suite(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    /// Every declared test, in declaration order.
    pub fn tests(&self) -> Vec<&Test> {
        let mut tests: Vec<&Test> = self.suites.iter().flat_map(|s| s.tests.iter()).collect();
        tests.sort_by_key(|t| t.sequence);
        tests
    }

    fn active_mut(&mut self) -> Option<&mut Suite> {
        let name = self.stack.last()?;
        self.suites.iter_mut().find(|s| &s.name == name)
    }
}
