//! Lintra Core - Analysis Driver Engine
//!
//! This crate provides the analysis infrastructure for Lintra:
//! - Scope-driven detector dispatch over a fixed project traversal order
//! - Multi-phase analysis with detector-requested, bounded repeats
//! - Suppression resolution across XML, source ASTs and bytecode models
//! - Heuristic source-location recovery and baseline/report filtering

pub mod baseline;
pub mod cache;
pub mod class;
pub mod client;
pub mod config;
pub mod context;
pub mod detector;
pub mod discovery;
pub mod dispatch;
pub mod dom;
pub mod driver;
pub mod finding;
pub mod issue;
pub mod listener;
pub mod location;
pub mod parser;
pub mod project;
pub mod registry;
pub mod scope;
pub mod suppress;

pub use baseline::{filter_findings, Baseline, BaselineEntry};
pub use cache::FileCache;
pub use class::{AnnotationInfo, ClassInfo, ClassMember, ClassNode, FieldInfo, MethodInfo};
pub use client::{CollectingClient, LintClient};
pub use config::{IgnoreRule, LintConfig, OptionsConfig};
pub use context::{
    BinaryContext, ClassContext, Context, GradleContext, ResourceFolderContext, SourceContext,
    XmlContext,
};
pub use detector::{
    AstScanner, BinaryResourceScanner, ClassScanner, Detector, GradleScanner, LegacyAstScanner,
    LineScanner, OtherFileScanner, ResourceFolderScanner, XmlScanner,
};
pub use dispatch::DispatchTable;
pub use dom::{XmlAttribute, XmlDocument, XmlElement};
pub use driver::{CancelHandle, HostCancelled, HostNotReady, LintDriver, LintRequest, MAX_PHASES};
pub use finding::{AnalysisSummary, Finding, Severity};
pub use issue::{Category, Implementation, Issue};
pub use listener::{DriverEvent, LintListener};
pub use location::{Location, Position, SearchDirection, SearchHints};
pub use parser::{ParseError, SourceLanguage, SourceParser};
pub use project::{Project, ProjectRegistry};
pub use registry::{
    builtin_issues, CompositeIssueRegistry, IssueRegistry, LINT_ERROR, MISSING_CLASS_OUTPUT,
};
pub use scope::{ResourceFolderKind, Scope, ScopeSet};
pub use suppress::SourceNode;

/// Lintra version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
