//! Suite tree models
//!
//! Defines suites, leaf tests, their hooks and source locations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::outcome::{IntoOutcome, Outcome};
use crate::error::RunnerError;

/// Source location of a suite or test, used only for reporting
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Location of the code calling the current function
    #[track_caller]
    pub fn caller() -> Self {
        let location = std::panic::Location::caller();
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Zero-argument procedure used for setup, teardown and test bodies
pub struct Hook(Box<dyn Fn() -> Outcome>);

impl Hook {
    pub fn new<F, R>(procedure: F) -> Self
    where
        F: Fn() -> R + 'static,
        R: IntoOutcome,
    {
        Hook(Box::new(move || procedure().into_outcome()))
    }

    pub fn call(&self) -> Outcome {
        (self.0)()
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook")
    }
}

/// Per-test hooks, consulted only when the enclosing suite has none
#[derive(Debug, Default)]
pub struct TestContext {
    pub setup: Option<Hook>,
    pub teardown: Option<Hook>,
}

/// Leaf test
#[derive(Debug)]
pub struct Test {
    name: String,
    location: Location,
    body: Hook,
    context: TestContext,
}

impl Test {
    #[track_caller]
    pub fn new<F, R>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn() -> R + 'static,
        R: IntoOutcome,
    {
        Self {
            name: name.into(),
            location: Location::caller(),
            body: Hook::new(body),
            context: TestContext::default(),
        }
    }

    pub fn with_setup<F, R>(mut self, setup: F) -> Self
    where
        F: Fn() -> R + 'static,
        R: IntoOutcome,
    {
        self.context.setup = Some(Hook::new(setup));
        self
    }

    pub fn with_teardown<F, R>(mut self, teardown: F) -> Self
    where
        F: Fn() -> R + 'static,
        R: IntoOutcome,
    {
        self.context.teardown = Some(Hook::new(teardown));
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn body(&self) -> &Hook {
        &self.body
    }

    pub fn context(&self) -> &TestContext {
        &self.context
    }
}

/// Entry of a suite: a leaf test or a nested suite
#[derive(Debug)]
pub enum Runnable {
    Test(Test),
    Suite(Suite),
}

impl Runnable {
    pub fn name(&self) -> &str {
        match self {
            Runnable::Test(test) => test.name(),
            Runnable::Suite(suite) => suite.name(),
        }
    }
}

/// Named, ordered grouping of tests and nested suites
#[derive(Debug)]
pub struct Suite {
    name: String,
    runnables: Vec<Runnable>,
    setup: Option<Hook>,
    teardown: Option<Hook>,
    location: Location,
}

impl Suite {
    #[track_caller]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runnables: Vec::new(),
            setup: None,
            teardown: None,
            location: Location::caller(),
        }
    }

    pub fn add_test(&mut self, test: Test) {
        self.runnables.push(Runnable::Test(test));
    }

    pub fn add_suite(&mut self, suite: Suite) {
        self.runnables.push(Runnable::Suite(suite));
    }

    pub fn with_test(mut self, test: Test) -> Self {
        self.add_test(test);
        self
    }

    pub fn with_suite(mut self, suite: Suite) -> Self {
        self.add_suite(suite);
        self
    }

    pub fn with_setup<F, R>(mut self, setup: F) -> Self
    where
        F: Fn() -> R + 'static,
        R: IntoOutcome,
    {
        self.setup = Some(Hook::new(setup));
        self
    }

    pub fn with_teardown<F, R>(mut self, teardown: F) -> Self
    where
        F: Fn() -> R + 'static,
        R: IntoOutcome,
    {
        self.teardown = Some(Hook::new(teardown));
        self
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn runnables(&self) -> &[Runnable] {
        &self.runnables
    }

    pub fn setup(&self) -> Option<&Hook> {
        self.setup.as_ref()
    }

    pub fn teardown(&self) -> Option<&Hook> {
        self.teardown.as_ref()
    }

    /// Number of leaf tests in this suite and all nested suites
    pub fn count_tests(&self) -> usize {
        self.runnables
            .iter()
            .map(|runnable| match runnable {
                Runnable::Test(_) => 1,
                Runnable::Suite(suite) => suite.count_tests(),
            })
            .sum()
    }

    /// Whether a leaf test named `name` exists at any depth
    pub fn has_test(&self, name: &str) -> bool {
        self.runnables.iter().any(|runnable| match runnable {
            Runnable::Test(test) => test.name() == name,
            Runnable::Suite(suite) => suite.has_test(name),
        })
    }

    /// All leaf tests with their paths, in execution order
    pub fn tests(&self) -> Vec<(TestPath, &Test)> {
        let mut found = Vec::new();
        self.collect_tests(&TestPath::root(), &mut found);
        found
    }

    fn collect_tests<'a>(&'a self, prefix: &TestPath, found: &mut Vec<(TestPath, &'a Test)>) {
        for (index, runnable) in self.runnables.iter().enumerate() {
            let path = prefix.child(index);
            match runnable {
                Runnable::Test(test) => found.push((path, test)),
                Runnable::Suite(suite) => suite.collect_tests(&path, found),
            }
        }
    }

    /// Find the test addressed by `path` together with its enclosing suites
    pub fn resolve(&self, path: &TestPath) -> Option<Resolved<'_>> {
        let (last, inner) = path.indices().split_last()?;
        let mut suites = vec![self];
        let mut current = self;
        for &index in inner {
            match current.runnables.get(index)? {
                Runnable::Suite(suite) => {
                    suites.push(suite);
                    current = suite;
                }
                Runnable::Test(_) => return None,
            }
        }
        match current.runnables.get(*last)? {
            Runnable::Test(test) => Some(Resolved { suites, test }),
            Runnable::Suite(_) => None,
        }
    }
}

/// Test located by a [`TestPath`]
#[derive(Debug)]
pub struct Resolved<'a> {
    /// Suites from the root down to the one declaring the test
    pub suites: Vec<&'a Suite>,
    pub test: &'a Test,
}

impl<'a> Resolved<'a> {
    pub fn enclosing(&self) -> &'a Suite {
        // resolve() always seeds the chain with the root suite
        self.suites[self.suites.len() - 1]
    }
}

/// Position of a leaf test in the tree, as runnable indices from the root
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TestPath(Vec<usize>);

impl TestPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for TestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        f.write_str(&parts.join("."))
    }
}

impl FromStr for TestPath {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RunnerError::MalformedTestPath(s.to_string()));
        }
        s.split('.')
            .map(|part| part.parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map(TestPath)
            .map_err(|_| RunnerError::MalformedTestPath(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Suite {
        Suite::new("root")
            .with_test(Test::new("a", || ()))
            .with_suite(
                Suite::new("nested")
                    .with_test(Test::new("b", || ()))
                    .with_suite(Suite::new("deep").with_test(Test::new("c", || ()))),
            )
            .with_test(Test::new("d", || ()))
    }

    #[test]
    fn test_count_tests() {
        assert_eq!(sample_tree().count_tests(), 4);
        assert_eq!(Suite::new("empty").count_tests(), 0);
    }

    #[test]
    fn test_has_test_at_any_depth() {
        let suite = sample_tree();
        assert!(suite.has_test("a"));
        assert!(suite.has_test("c"));
        assert!(!suite.has_test("nested"));
        assert!(!suite.has_test("missing"));
    }

    #[test]
    fn test_tests_in_execution_order() {
        let suite = sample_tree();
        let listed: Vec<(String, &str)> = suite
            .tests()
            .into_iter()
            .map(|(path, test)| (path.to_string(), test.name()))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("0".to_string(), "a"),
                ("1.0".to_string(), "b"),
                ("1.1.0".to_string(), "c"),
                ("2".to_string(), "d"),
            ]
        );
    }

    #[test]
    fn test_resolve_path() {
        let suite = sample_tree();
        let path: TestPath = "1.1.0".parse().unwrap();
        let resolved = suite.resolve(&path).unwrap();
        assert_eq!(resolved.test.name(), "c");
        let names: Vec<&str> = resolved.suites.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["root", "nested", "deep"]);
        assert_eq!(resolved.enclosing().name(), "deep");

        assert!(suite.resolve(&"1".parse().unwrap()).is_none());
        assert!(suite.resolve(&"9".parse().unwrap()).is_none());
        assert!(suite.resolve(&"0.0".parse().unwrap()).is_none());
    }

    #[test]
    fn test_malformed_path() {
        assert!("".parse::<TestPath>().is_err());
        assert!("1.x".parse::<TestPath>().is_err());
        assert!("-1".parse::<TestPath>().is_err());
    }

    #[test]
    fn test_location_is_captured() {
        let test = Test::new("here", || ());
        assert!(test.location().file.ends_with("suite.rs"));
        assert!(test.location().line > 0);
    }
}
