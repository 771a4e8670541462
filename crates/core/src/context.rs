//! Per-visit contexts handed to detector callbacks
//!
//! A [`Context`] is created for one visited unit (file, folder, class) and
//! discarded after it. Findings, log lines and repeat requests are buffered
//! in the context and drained by the driver once the visit returns, so
//! detectors only ever need `&mut` access to the context itself.

use crate::class::{ClassInfo, ClassMember, ClassNode};
use crate::dom::{XmlDocument, XmlElement};
use crate::finding::{Finding, Severity};
use crate::issue::Issue;
use crate::location::Location;
use crate::parser::legacy::{LegacyAst, LegacyNodeId};
use crate::parser::SourceLanguage;
use crate::project::Project;
use crate::scope::{ResourceFolderKind, ScopeSet};
use crate::suppress::{self, SourceNode, SUPPRESS_TOKEN};
use std::any::TypeId;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A detector's wish to run again in the next phase, recorded against the
/// detector that was being invoked at the time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RepeatRequest {
    pub detector: TypeId,
    pub scope: Option<ScopeSet>,
}

/// Everything a context buffered during one visit.
pub(crate) struct ContextPayload {
    pub findings: Vec<Finding>,
    pub logs: Vec<(Severity, String)>,
    pub repeats: Vec<RepeatRequest>,
}

/// Shared state for one visited unit.
pub struct Context<'a> {
    /// Project the visited file belongs to.
    pub project: &'a Project,
    /// Root project the analysis was requested on; owns the configuration
    /// every reporting decision is made against.
    pub main_project: &'a Project,
    /// 1-based analysis phase.
    pub phase: u8,
    /// Scope set active in this phase.
    pub scope: ScopeSet,
    /// The visited file lies under a test root.
    pub is_test_source: bool,
    file: PathBuf,
    contents: Option<Arc<String>>,
    /// Precomputed once per file: does the text mention the suppression
    /// token at all? Saves a backward line scan per finding when it doesn't.
    has_marker: bool,
    pub(crate) current_detector: Option<(TypeId, &'static str)>,
    findings: Vec<Finding>,
    logs: Vec<(Severity, String)>,
    repeats: Vec<RepeatRequest>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        project: &'a Project,
        main_project: &'a Project,
        file: PathBuf,
        contents: Option<Arc<String>>,
        phase: u8,
        scope: ScopeSet,
        is_test_source: bool,
    ) -> Context<'a> {
        let has_marker = contents
            .as_ref()
            .is_some_and(|c| c.contains(SUPPRESS_TOKEN));
        Context {
            project,
            main_project,
            phase,
            scope,
            is_test_source,
            file,
            contents,
            has_marker,
            current_detector: None,
            findings: Vec::new(),
            logs: Vec::new(),
            repeats: Vec::new(),
        }
    }

    /// The file (or folder) being visited.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Text of the visited file; `None` for binary and class visits.
    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref().map(|s| s.as_str())
    }

    /// Record an infrastructure message; the driver forwards it to the
    /// host's log sink, never to the findings stream.
    pub fn log(&mut self, severity: Severity, message: impl Into<String>) {
        self.logs.push((severity, message.into()));
    }

    /// Ask for another analysis phase over this root project. `scope`
    /// narrows what the next phase traverses; `None` keeps the current
    /// scope. Granted at most twice per project.
    pub fn request_repeat(&mut self, scope: Option<ScopeSet>) {
        if let Some((detector, _)) = self.current_detector {
            self.repeats.push(RepeatRequest { detector, scope });
        }
    }

    /// Report a finding that has no syntactic anchor (file-level checks,
    /// property/proguard lines). Comment suppression still applies when the
    /// location carries an offset into this file.
    pub fn report(&mut self, issue: &'static Issue, location: Location, message: impl Into<String>) {
        self.report_node(issue, None, location, message);
    }

    /// Report a finding anchored at a node, letting annotation and comment
    /// suppression see the enclosing declarations.
    pub fn report_node(
        &mut self,
        issue: &'static Issue,
        node: Option<&SourceNode<'_>>,
        location: Location,
        message: impl Into<String>,
    ) {
        let message = message.into();
        let config = &self.main_project.config;

        if !config.is_enabled(issue) {
            // A detector reporting an issue its table was filtered on is a
            // detector bug, not a user-visible finding.
            let detector = self
                .current_detector
                .map(|(_, name)| name)
                .unwrap_or("driver");
            self.logs.push((
                Severity::Warning,
                format!("{detector} reported disabled issue {}", issue.id),
            ));
            return;
        }

        if let Some(node) = node {
            if suppress::is_suppressed(issue.id, node) {
                return;
            }
        }
        if self.comment_suppressed(issue.id, node, &location) {
            return;
        }

        let rel = location
            .file
            .strip_prefix(&self.main_project.dir)
            .unwrap_or(&location.file);
        if config.is_ignored(issue.id, rel, &message) {
            return;
        }

        let severity = config.severity_for(issue);
        self.findings.push(Finding {
            issue: issue.id.to_string(),
            severity,
            message,
            location,
            suggestion: None,
        });
    }

    /// Would a finding for `issue` at `node` be suppressed? Checks both the
    /// annotation chain and comment directives.
    pub fn is_suppressed(&self, issue: &'static Issue, node: &SourceNode<'_>) -> bool {
        if suppress::is_suppressed(issue.id, node) {
            return true;
        }
        self.comment_suppressed_at(issue.id, node.start_offset())
    }

    fn comment_suppressed(
        &self,
        issue_id: &str,
        node: Option<&SourceNode<'_>>,
        location: &Location,
    ) -> bool {
        if location.file != self.file {
            return false;
        }
        let offset = node
            .and_then(|n| n.start_offset())
            .or_else(|| location.start.map(|p| p.offset));
        self.comment_suppressed_at(issue_id, offset)
    }

    fn comment_suppressed_at(&self, issue_id: &str, offset: Option<usize>) -> bool {
        if !self.has_marker {
            return false;
        }
        let (Some(contents), Some(offset)) = (self.contents(), offset) else {
            return false;
        };
        let Some(marker) = suppress::comment_marker_for(&self.file) else {
            return false;
        };
        suppress::comment_suppressed(issue_id, contents, offset, marker)
    }

    pub(crate) fn into_payload(self) -> ContextPayload {
        ContextPayload {
            findings: self.findings,
            logs: self.logs,
            repeats: self.repeats,
        }
    }
}

/// Context for manifest and resource XML visits.
pub struct XmlContext<'a> {
    pub context: Context<'a>,
    pub document: &'a XmlDocument,
    /// Kind of the containing resource folder; `None` for the manifest.
    pub folder_kind: Option<ResourceFolderKind>,
}

impl<'a> XmlContext<'a> {
    /// Report at an element, so `lintra:ignore` attributes on it and its
    /// ancestors are honored.
    pub fn report(
        &mut self,
        issue: &'static Issue,
        element: Option<XmlElement<'_>>,
        location: Location,
        message: impl Into<String>,
    ) {
        let node = element.map(SourceNode::Xml);
        self.context.report_node(issue, node.as_ref(), location, message);
    }

    /// Span of an element's tags in the document.
    pub fn location(&self, element: XmlElement<'_>) -> Location {
        let contents = self.context.contents().unwrap_or("");
        Location::from_offsets(
            self.context.file(),
            contents,
            element.start_offset(),
            element.end_offset(),
        )
    }
}

/// Context for Java/Kotlin source visits.
pub struct SourceContext<'a> {
    pub context: Context<'a>,
    pub language: SourceLanguage,
    source: &'a str,
}

impl<'a> SourceContext<'a> {
    pub(crate) fn new(context: Context<'a>, language: SourceLanguage, source: &'a str) -> Self {
        SourceContext {
            context,
            language,
            source,
        }
    }

    /// The parsed text. Same as `context.contents()`, but never `None`.
    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn report(
        &mut self,
        issue: &'static Issue,
        node: Option<tree_sitter::Node<'_>>,
        location: Location,
        message: impl Into<String>,
    ) {
        let source = self.source;
        let language = self.language;
        let node = node.map(|node| SourceNode::Ast {
            node,
            source,
            language,
        });
        self.context.report_node(issue, node.as_ref(), location, message);
    }

    /// Report against a node of the deprecated flat AST.
    pub fn report_legacy(
        &mut self,
        issue: &'static Issue,
        ast: &LegacyAst,
        node: LegacyNodeId,
        location: Location,
        message: impl Into<String>,
    ) {
        let node = SourceNode::Legacy { ast, node };
        self.context.report_node(issue, Some(&node), location, message);
    }

    /// Span of a tree node in the source.
    pub fn location(&self, node: tree_sitter::Node<'_>) -> Location {
        Location::from_offsets(
            self.context.file(),
            self.source,
            node.start_byte(),
            node.end_byte(),
        )
    }

    /// Node text, for symbol extraction.
    pub fn text(&self, node: tree_sitter::Node<'_>) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }
}

/// Context for compiled-class visits.
pub struct ClassContext<'a> {
    pub context: Context<'a>,
    pub class: &'a ClassInfo,
    outer: &'a [&'a ClassInfo],
}

impl<'a> ClassContext<'a> {
    pub(crate) fn new(
        context: Context<'a>,
        class: &'a ClassInfo,
        outer: &'a [&'a ClassInfo],
    ) -> Self {
        ClassContext {
            context,
            class,
            outer,
        }
    }

    /// Enclosing classes, nearest first.
    pub fn outer_classes(&self) -> &'a [&'a ClassInfo] {
        self.outer
    }

    /// Report against the class, or one of its members when given.
    pub fn report(
        &mut self,
        issue: &'static Issue,
        member: Option<ClassMember<'a>>,
        location: Location,
        message: impl Into<String>,
    ) {
        let node = SourceNode::Class(ClassNode {
            class: self.class,
            member,
            outer: self.outer,
        });
        self.context.report_node(issue, Some(&node), location, message);
    }

    /// Class files carry no text, so the best location is the file itself.
    pub fn location(&self) -> Location {
        Location::file_level(self.context.file())
    }
}

/// Context for Gradle build-script visits.
pub struct GradleContext<'a> {
    pub context: Context<'a>,
}

impl GradleContext<'_> {
    pub fn source(&self) -> &str {
        self.context.contents().unwrap_or("")
    }

    pub fn report(&mut self, issue: &'static Issue, location: Location, message: impl Into<String>) {
        self.context.report(issue, location, message);
    }
}

/// Context for non-XML resource files (images, raw assets).
pub struct BinaryContext<'a> {
    pub context: Context<'a>,
    pub folder_kind: Option<ResourceFolderKind>,
}

impl BinaryContext<'_> {
    /// Raw bytes of the visited file.
    pub fn bytes(&self) -> io::Result<Vec<u8>> {
        fs::read(self.context.file())
    }

    pub fn report(&mut self, issue: &'static Issue, location: Location, message: impl Into<String>) {
        self.context.report(issue, location, message);
    }
}

/// Context for per-folder resource visits; the context's "file" is the
/// folder itself.
pub struct ResourceFolderContext<'a> {
    pub context: Context<'a>,
    pub folder_kind: Option<ResourceFolderKind>,
}

impl ResourceFolderContext<'_> {
    pub fn report(&mut self, issue: &'static Issue, location: Location, message: impl Into<String>) {
        self.context.report(issue, location, message);
    }
}
