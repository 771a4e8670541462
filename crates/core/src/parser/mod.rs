//! Source parsing for the analysis engine
//!
//! Java and Kotlin sources are parsed with Tree-sitter. The per-language
//! modules also know which node kinds count as declarations and how to read
//! suppression annotations off them; [`legacy`] hosts the flat AST used by
//! detectors that predate the Tree-sitter backend.

pub mod java;
pub mod kotlin;
pub mod legacy;

use std::fmt;
use std::path::Path;
use thiserror::Error;
use tree_sitter::{Parser, Tree};

/// Error types for parsing operations
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse file: {0}")]
    ParseFailed(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),

    #[error("XML error: {0}")]
    Xml(String),
}

/// The source languages the engine parses itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    Java,
    Kotlin,
}

impl SourceLanguage {
    /// Detect the language from a file extension.
    pub fn from_path(path: &Path) -> Option<SourceLanguage> {
        match path.extension()?.to_str()? {
            "java" => Some(SourceLanguage::Java),
            "kt" | "kts" => Some(SourceLanguage::Kotlin),
            _ => None,
        }
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLanguage::Java => write!(f, "java"),
            SourceLanguage::Kotlin => write!(f, "kotlin"),
        }
    }
}

/// Parser for the supported source languages.
pub struct SourceParser {
    java: tree_sitter::Language,
    kotlin: tree_sitter::Language,
}

impl Default for SourceParser {
    fn default() -> Self {
        Self {
            java: tree_sitter_java::LANGUAGE.into(),
            kotlin: tree_sitter_kotlin_ng::LANGUAGE.into(),
        }
    }
}

impl SourceParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse source text into a syntax tree.
    pub fn parse(&self, source: &str, language: SourceLanguage) -> Result<Tree, ParseError> {
        let grammar = match language {
            SourceLanguage::Java => &self.java,
            SourceLanguage::Kotlin => &self.kotlin,
        };
        let mut parser = Parser::new();
        parser
            .set_language(grammar)
            .map_err(|e| ParseError::TreeSitter(e.to_string()))?;
        parser.parse(source, None).ok_or_else(|| {
            ParseError::ParseFailed(format!("Failed to parse {} source", language))
        })
    }

    /// Parse a file, detecting the language from its extension.
    pub fn parse_file(&self, path: &Path, source: &str) -> Result<Tree, ParseError> {
        let language = SourceLanguage::from_path(path).ok_or_else(|| {
            ParseError::UnsupportedLanguage(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            )
        })?;
        self.parse(source, language)
    }
}

/// Is `kind` a declaration node in the given language? Suppression walks
/// ascend through these.
pub(crate) fn is_declaration(kind: &str, language: SourceLanguage) -> bool {
    match language {
        SourceLanguage::Java => java::is_declaration(kind),
        SourceLanguage::Kotlin => kotlin::is_declaration(kind),
    }
}

/// Suppression annotation values declared directly on `node`.
pub(crate) fn suppression_values(
    node: &tree_sitter::Node,
    source: &str,
    language: SourceLanguage,
    out: &mut Vec<String>,
) {
    match language {
        SourceLanguage::Java => java::suppression_values(node, source, out),
        SourceLanguage::Kotlin => kotlin::suppression_values(node, source, out),
    }
}

/// Visit `node` and its whole subtree in document order.
pub(crate) fn for_each_node<'a>(
    node: tree_sitter::Node<'a>,
    visit: &mut dyn FnMut(tree_sitter::Node<'a>),
) {
    visit(node);
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        for_each_node(child, visit);
    }
}

/// Text of a node's named field, if present.
pub(crate) fn node_field_text(
    node: &tree_sitter::Node,
    field: &str,
    source: &str,
) -> Option<String> {
    node.child_by_field_name(field)?
        .utf8_text(source.as_bytes())
        .ok()
        .map(|s| s.to_string())
}

/// First direct child of the given kind.
pub(crate) fn find_child_by_kind<'a>(
    node: &tree_sitter::Node<'a>,
    kind: &str,
) -> Option<tree_sitter::Node<'a>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == kind);
    found
}
