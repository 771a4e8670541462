//! Issue descriptors: the durable identity of every check

use crate::detector::Detector;
use crate::finding::Severity;
use crate::scope::{Scope, ScopeSet};
use std::any::TypeId;
use std::fmt;

/// Broad grouping used when presenting findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Correctness,
    Security,
    Performance,
    Usability,
    Accessibility,
    Internationalization,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Correctness => write!(f, "correctness"),
            Category::Security => write!(f, "security"),
            Category::Performance => write!(f, "performance"),
            Category::Usability => write!(f, "usability"),
            Category::Accessibility => write!(f, "accessibility"),
            Category::Internationalization => write!(f, "internationalization"),
        }
    }
}

fn make_detector<T: Detector + Default + 'static>() -> Box<dyn Detector> {
    Box::<T>::default()
}

/// Binds an issue to the detector type that checks it and the scopes that
/// detector must see.
///
/// The detector type doubles as the identity used for instance deduplication:
/// issues sharing a detector type share one instance per analysis run.
pub struct Implementation {
    pub(crate) detector_id: TypeId,
    pub(crate) detector_name: &'static str,
    pub(crate) factory: fn() -> Box<dyn Detector>,
    pub scope: ScopeSet,
}

impl Implementation {
    /// Create an implementation for detector type `T` over the given scopes.
    ///
    /// Registering both the single-file and the whole-project variant of the
    /// same category (for example `JavaFile` and `AllJavaFiles`) is a
    /// registration bug and trips a debug assertion.
    pub fn new<T: Detector + Default + 'static>(scope: ScopeSet) -> Implementation {
        debug_assert!(
            !(scope.contains(Scope::ResourceFile) && scope.contains(Scope::AllResourceFiles)),
            "{}: RESOURCE_FILE and ALL_RESOURCE_FILES are mutually exclusive",
            std::any::type_name::<T>()
        );
        debug_assert!(
            !(scope.contains(Scope::JavaFile) && scope.contains(Scope::AllJavaFiles)),
            "{}: JAVA_FILE and ALL_JAVA_FILES are mutually exclusive",
            std::any::type_name::<T>()
        );
        debug_assert!(
            !(scope.contains(Scope::ClassFile) && scope.contains(Scope::AllClassFiles)),
            "{}: CLASS_FILE and ALL_CLASS_FILES are mutually exclusive",
            std::any::type_name::<T>()
        );
        Implementation {
            detector_id: TypeId::of::<T>(),
            detector_name: std::any::type_name::<T>(),
            factory: make_detector::<T>,
            scope,
        }
    }

    /// The `TypeId` of the implementing detector.
    pub fn detector_id(&self) -> TypeId {
        self.detector_id
    }

    /// The type name of the implementing detector, for diagnostics.
    pub fn detector_name(&self) -> &'static str {
        self.detector_name
    }

    /// Construct a fresh detector instance.
    pub fn new_detector(&self) -> Box<dyn Detector> {
        (self.factory)()
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("detector", &self.detector_name)
            .field("scope", &self.scope)
            .finish()
    }
}

/// A single registered check.
///
/// Issues are declared as `static` values (typically via `LazyLock`) and
/// referenced by `&'static Issue` everywhere, so identity comparisons are
/// cheap and the descriptor never needs cloning.
#[derive(Debug)]
pub struct Issue {
    /// Stable identifier used in configuration, suppressions and baselines.
    pub id: &'static str,
    /// One-line description.
    pub summary: &'static str,
    /// Longer explanation shown alongside findings.
    pub explanation: &'static str,
    pub category: Category,
    /// Default severity; per-project configuration can override it.
    pub severity: Severity,
    /// Whether this check runs unless explicitly enabled.
    pub enabled_by_default: bool,
    pub implementation: Implementation,
}

impl Issue {
    pub fn create(
        id: &'static str,
        summary: &'static str,
        explanation: &'static str,
        category: Category,
        severity: Severity,
        implementation: Implementation,
    ) -> Issue {
        Issue {
            id,
            summary,
            explanation,
            category,
            severity,
            enabled_by_default: true,
            implementation,
        }
    }

    /// Mark the issue as off unless a project opts in.
    pub fn disabled_by_default(mut self) -> Issue {
        self.enabled_by_default = false;
        self
    }
}
