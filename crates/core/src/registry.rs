//! Issue registries: how detectors are published to the driver

use crate::detector::Detector;
use crate::finding::Severity;
use crate::issue::{Category, Implementation, Issue};
use crate::scope::ScopeSet;
use std::sync::LazyLock;

/// A provider of issues. Tool vendors implement this once per issue pack;
/// hosts hand one (often a [`CompositeIssueRegistry`]) to the driver.
pub trait IssueRegistry {
    /// All issues this registry publishes. References must be `'static`;
    /// registries conventionally declare issues in `LazyLock` statics.
    fn issues(&self) -> Vec<&'static Issue>;
}

/// Merges several registries into one, preserving registration order.
#[derive(Default)]
pub struct CompositeIssueRegistry {
    registries: Vec<Box<dyn IssueRegistry>>,
}

impl CompositeIssueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, registry: Box<dyn IssueRegistry>) {
        self.registries.push(registry);
    }

    pub fn with(mut self, registry: Box<dyn IssueRegistry>) -> Self {
        self.add(registry);
        self
    }
}

impl IssueRegistry for CompositeIssueRegistry {
    fn issues(&self) -> Vec<&'static Issue> {
        let mut all = Vec::new();
        for registry in &self.registries {
            all.extend(registry.issues());
        }
        all
    }
}

/// Placeholder detector type behind the driver's own issues. Never dispatched;
/// the driver reports these directly.
#[derive(Default)]
struct DriverDetector;

impl Detector for DriverDetector {}

/// Reported when a detector panics while analyzing a file. The analysis run
/// keeps going; the finding carries a capped summary of the panic payload.
pub static LINT_ERROR: LazyLock<Issue> = LazyLock::new(|| {
    Issue::create(
        "LintError",
        "A detector crashed during analysis",
        "A detector raised a panic while processing a file. The file's partial \
         results were discarded and analysis continued. This usually indicates \
         a bug in the detector, not in the project being analyzed.",
        Category::Correctness,
        Severity::Error,
        Implementation::new::<DriverDetector>(ScopeSet::empty()),
    )
});

/// Reported when class-file checks are requested but the project has no
/// compiled output to analyze.
pub static MISSING_CLASS_OUTPUT: LazyLock<Issue> = LazyLock::new(|| {
    Issue::create(
        "MissingClassOutput",
        "Class-file checks requested but no compiled classes found",
        "One or more enabled checks operate on compiled bytecode, but the \
         project contains no class output directories. Compile the project \
         before running analysis, or disable the bytecode checks.",
        Category::Correctness,
        Severity::Warning,
        Implementation::new::<DriverDetector>(ScopeSet::empty()),
    )
});

/// The driver's own issues, appended to every merged registry.
pub fn builtin_issues() -> Vec<&'static Issue> {
    vec![&LINT_ERROR, &MISSING_CLASS_OUTPUT]
}
