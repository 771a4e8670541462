//! Suppression resolution across every representation the engine analyzes
//!
//! A finding can be silenced in four places: an annotation on an enclosing
//! declaration (Tree-sitter or legacy AST), a `lintra:ignore` attribute on an
//! enclosing XML element, an annotation recorded in bytecode, or a marker
//! comment near the reported line. Detectors never check any of this
//! themselves; the reporting path asks this module right before a finding
//! would be emitted.

use crate::class::ClassNode;
use crate::dom::XmlElement;
use crate::parser::legacy::{LegacyAst, LegacyNodeId};
use crate::parser::{self, SourceLanguage};
use std::path::Path;

/// Token shared by all comment markers. Files whose contents don't contain
/// it can skip comment scanning entirely.
pub const SUPPRESS_TOKEN: &str = "lintra-ignore";

/// XML attribute that lists suppressed issue ids, comma-separated.
pub const IGNORE_ATTR: &str = "lintra:ignore";

/// Prefix IDEs prepend to issue ids in `@SuppressWarnings` values.
const IDE_PREFIX: &str = "Lintra";

const COMMENT_MARKER_SOURCE: &str = "//lintra-ignore";
const COMMENT_MARKER_XML: &str = "<!--lintra-ignore";
const COMMENT_MARKER_HASH: &str = "#lintra-ignore";

/// The place a finding is attached to, in whichever representation the
/// detector was working with.
#[derive(Debug, Clone, Copy)]
pub enum SourceNode<'a> {
    /// A Tree-sitter node in a parsed source file.
    Ast {
        node: tree_sitter::Node<'a>,
        source: &'a str,
        language: SourceLanguage,
    },
    /// A node in the deprecated flat AST.
    Legacy {
        ast: &'a LegacyAst,
        node: LegacyNodeId,
    },
    /// An element in a resource or manifest document.
    Xml(XmlElement<'a>),
    /// A position in the class-file model.
    Class(ClassNode<'a>),
}

impl SourceNode<'_> {
    /// Byte offset where the node starts, for comment scanning. The class
    /// model carries no text, so it has no offset.
    pub fn start_offset(&self) -> Option<usize> {
        match self {
            SourceNode::Ast { node, .. } => Some(node.start_byte()),
            SourceNode::Legacy { ast, node } => Some(ast.node(*node).start),
            SourceNode::Xml(element) => Some(element.start_offset()),
            SourceNode::Class(_) => None,
        }
    }
}

/// Does a suppression value written by a user match this issue?
///
/// Accepted spellings: `all`, the id itself (both case-insensitive), and
/// the id with the IDE's `Lintra` prefix, matched case-insensitively after
/// the prefix but required to end with the id's exact spelling.
pub fn matches_suppression_value(issue_id: &str, value: &str) -> bool {
    let value = value.trim();
    if value.eq_ignore_ascii_case("all") {
        return true;
    }
    if value.eq_ignore_ascii_case(issue_id) {
        return true;
    }
    if let Some(rest) = value.strip_prefix(IDE_PREFIX) {
        return rest.eq_ignore_ascii_case(issue_id) && value.ends_with(issue_id);
    }
    false
}

/// Is this annotation one of the suppression carriers?
pub(crate) fn is_suppression_annotation(name: &str) -> bool {
    let simple = name.rsplit(['.', '/']).next().unwrap_or(name);
    matches!(simple, "SuppressLint" | "SuppressWarnings" | "Suppress")
}

/// Check annotation- and attribute-based suppression by walking from `node`
/// up through its enclosing declarations.
pub fn is_suppressed(issue_id: &str, node: &SourceNode<'_>) -> bool {
    match node {
        SourceNode::Ast {
            node,
            source,
            language,
        } => ast_suppressed(issue_id, *node, source, *language),
        SourceNode::Legacy { ast, node } => legacy_suppressed(issue_id, ast, *node),
        SourceNode::Xml(element) => xml_suppressed(issue_id, *element),
        SourceNode::Class(class_node) => class_suppressed(issue_id, class_node),
    }
}

fn ast_suppressed(
    issue_id: &str,
    node: tree_sitter::Node<'_>,
    source: &str,
    language: SourceLanguage,
) -> bool {
    let mut current = Some(node);
    while let Some(n) = current {
        if parser::is_declaration(n.kind(), language) {
            let mut values = Vec::new();
            parser::suppression_values(&n, source, language, &mut values);
            if values
                .iter()
                .any(|v| matches_suppression_value(issue_id, v))
            {
                return true;
            }
        }
        current = n.parent();
    }
    false
}

fn legacy_suppressed(issue_id: &str, ast: &LegacyAst, node: LegacyNodeId) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        let n = ast.node(id);
        for annotation in &n.annotations {
            if is_suppression_annotation(&annotation.name)
                && annotation
                    .values
                    .iter()
                    .any(|v| matches_suppression_value(issue_id, v))
            {
                return true;
            }
        }
        current = n.parent;
    }
    false
}

fn xml_suppressed(issue_id: &str, element: XmlElement<'_>) -> bool {
    let mut current = Some(element);
    while let Some(el) = current {
        if let Some(ignore) = el.attribute(IGNORE_ATTR) {
            if ignore
                .split(',')
                .any(|v| matches_suppression_value(issue_id, v))
            {
                return true;
            }
        }
        current = el.parent();
    }
    false
}

fn annotations_suppress(annotations: &[crate::class::AnnotationInfo], issue_id: &str) -> bool {
    annotations.iter().any(|a| {
        is_suppression_annotation(a.simple_name())
            && a.values
                .iter()
                .any(|v| matches_suppression_value(issue_id, v))
    })
}

fn class_suppressed(issue_id: &str, node: &ClassNode<'_>) -> bool {
    if let Some(member) = node.member {
        if annotations_suppress(member.annotations(), issue_id) {
            return true;
        }
    }
    if annotations_suppress(&node.class.annotations, issue_id) {
        return true;
    }
    // Anonymous classes carry no annotations of their own; the relevant
    // suppression lives on whichever enclosing member constructed them.
    let mut current = node.class;
    for outer in node.outer {
        if current.is_anonymous() {
            for method in &outer.methods {
                if method
                    .new_instances
                    .iter()
                    .any(|n| n == &current.internal_name)
                    && annotations_suppress(&method.annotations, issue_id)
                {
                    return true;
                }
            }
        }
        if annotations_suppress(&outer.annotations, issue_id) {
            return true;
        }
        current = outer;
    }
    false
}

/// The marker comment style for a file, by extension.
pub(crate) fn comment_marker_for(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()? {
        "java" | "kt" | "kts" | "gradle" => Some(COMMENT_MARKER_SOURCE),
        "xml" => Some(COMMENT_MARKER_XML),
        "properties" | "pro" | "cfg" => Some(COMMENT_MARKER_HASH),
        _ => None,
    }
}

/// Check for a marker comment covering the byte at `offset`: either a
/// trailing directive on the same line, or a directive leading the nearest
/// non-blank line above it.
pub(crate) fn comment_suppressed(
    issue_id: &str,
    contents: &str,
    offset: usize,
    marker: &str,
) -> bool {
    let mut offset = offset.min(contents.len());
    while !contents.is_char_boundary(offset) {
        offset -= 1;
    }
    let line_start = contents[..offset]
        .rfind('\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let line_end = contents[line_start..]
        .find('\n')
        .map(|rel| line_start + rel)
        .unwrap_or(contents.len());

    if directive_matches(issue_id, &contents[line_start..line_end], marker) {
        return true;
    }

    // Nearest non-blank line above; there the marker must start the line.
    let mut end = line_start;
    while end > 0 {
        let prev_start = contents[..end - 1].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line = &contents[prev_start..end - 1];
        if !line.trim().is_empty() {
            return line.trim_start().starts_with(marker)
                && directive_matches(issue_id, line, marker);
        }
        end = prev_start;
    }
    false
}

fn directive_matches(issue_id: &str, line: &str, marker: &str) -> bool {
    let Some(idx) = line.find(marker) else {
        return false;
    };
    let mut rest = &line[idx + marker.len()..];
    if let Some(trimmed) = rest.trim_end().strip_suffix("-->") {
        rest = trimmed;
    }
    rest.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .any(|v| matches_suppression_value(issue_id, v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_matching_rules() {
        assert!(matches_suppression_value("MyId", "all"));
        assert!(matches_suppression_value("MyId", "ALL"));
        assert!(matches_suppression_value("MyId", "MyId"));
        assert!(matches_suppression_value("MyId", "myid"));
        assert!(matches_suppression_value("MyId", "LintraMyId"));
        // The prefixed form must keep the id's exact spelling at the end.
        assert!(!matches_suppression_value("MyId", "Lintramyid"));
        assert!(!matches_suppression_value("MyId", "AnythingMyId"));
        assert!(!matches_suppression_value("MyId", "OtherId"));
    }

    #[test]
    fn annotation_names() {
        assert!(is_suppression_annotation("SuppressLint"));
        assert!(is_suppression_annotation("android.annotation.SuppressLint"));
        assert!(is_suppression_annotation("kotlin.Suppress"));
        assert!(is_suppression_annotation("java/lang/SuppressWarnings"));
        assert!(!is_suppression_annotation("Override"));
    }

    #[test]
    fn comment_scan_skips_blank_lines() {
        let contents = "//lintra-ignore MyId\n\n\nint x = f();\n";
        let offset = contents.find("int").unwrap();
        assert!(comment_suppressed("MyId", contents, offset, "//lintra-ignore"));
        assert!(!comment_suppressed("Other", contents, offset, "//lintra-ignore"));
    }

    #[test]
    fn comment_scan_same_line() {
        let contents = "int x = f(); //lintra-ignore MyId, Second\n";
        let offset = contents.find("f()").unwrap();
        assert!(comment_suppressed("MyId", contents, offset, "//lintra-ignore"));
        assert!(comment_suppressed("Second", contents, offset, "//lintra-ignore"));
        assert!(!comment_suppressed("Third", contents, offset, "//lintra-ignore"));
    }

    #[test]
    fn xml_directive_strips_comment_close() {
        let contents = "<!--lintra-ignore MyId-->\n<TextView/>\n";
        let offset = contents.find("<TextView").unwrap();
        assert!(comment_suppressed("MyId", contents, offset, "<!--lintra-ignore"));
    }

    #[test]
    fn non_adjacent_comment_does_not_apply() {
        let contents = "//lintra-ignore MyId\nint y = 0;\nint x = f();\n";
        let offset = contents.find("int x").unwrap();
        assert!(!comment_suppressed("MyId", contents, offset, "//lintra-ignore"));
    }

    #[test]
    fn preceding_line_directive_must_lead_the_line() {
        let contents = "int y = 0; //lintra-ignore MyId\nint x = f();\n";
        let offset = contents.find("int x").unwrap();
        assert!(!comment_suppressed("MyId", contents, offset, "//lintra-ignore"));
    }
}
