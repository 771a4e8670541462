//! Flat AST for the deprecated source-scanner backend
//!
//! Older detectors predate the Tree-sitter backend and walk a simplified,
//! arena-allocated view of a compilation unit: declarations only, each with
//! its byte span, parent and annotations. The driver synthesizes this view
//! from the Tree-sitter parse on demand, so legacy detectors keep working
//! without a second parser, at the cost of an extra conversion pass per file.

use super::{node_field_text, SourceLanguage};
use tree_sitter::Tree;

/// Index into [`LegacyAst`]'s node arena.
pub type LegacyNodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyKind {
    CompilationUnit,
    Class,
    Method,
    AnnotationMethod,
    Field,
    Variable,
}

#[derive(Debug, Clone)]
pub struct LegacyAnnotation {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LegacyNode {
    pub kind: LegacyKind,
    pub name: Option<String>,
    /// Byte span in the original source.
    pub start: usize,
    pub end: usize,
    pub parent: Option<LegacyNodeId>,
    pub annotations: Vec<LegacyAnnotation>,
}

/// The arena. Node 0 is always the compilation unit.
#[derive(Debug)]
pub struct LegacyAst {
    nodes: Vec<LegacyNode>,
}

impl Default for LegacyAst {
    fn default() -> Self {
        Self::new()
    }
}

impl LegacyAst {
    /// An empty unit. Use [`push_node`](Self::push_node) to grow it; mostly
    /// useful to hosts and tests that build ASTs by hand.
    pub fn new() -> LegacyAst {
        LegacyAst {
            nodes: vec![LegacyNode {
                kind: LegacyKind::CompilationUnit,
                name: None,
                start: 0,
                end: 0,
                parent: None,
                annotations: Vec::new(),
            }],
        }
    }

    /// Synthesize the flat view from a Tree-sitter parse.
    pub fn from_tree(tree: &Tree, source: &str, language: SourceLanguage) -> LegacyAst {
        let mut ast = LegacyAst::new();
        ast.nodes[0].end = source.len();
        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            build(&mut ast, child, source, language, 0);
        }
        ast
    }

    pub fn root(&self) -> LegacyNodeId {
        0
    }

    pub fn node(&self, id: LegacyNodeId) -> &LegacyNode {
        &self.nodes[id]
    }

    pub fn parent(&self, id: LegacyNodeId) -> Option<LegacyNodeId> {
        self.nodes[id].parent
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes with their ids, in creation (document) order.
    pub fn iter(&self) -> impl Iterator<Item = (LegacyNodeId, &LegacyNode)> {
        self.nodes.iter().enumerate()
    }

    pub fn children(&self, id: LegacyNodeId) -> Vec<LegacyNodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent == Some(id))
            .map(|(i, _)| i)
            .collect()
    }

    /// Append a node under `parent` and return its id.
    pub fn push_node(
        &mut self,
        parent: LegacyNodeId,
        kind: LegacyKind,
        name: Option<String>,
        start: usize,
        end: usize,
        annotations: Vec<LegacyAnnotation>,
    ) -> LegacyNodeId {
        let id = self.nodes.len();
        self.nodes.push(LegacyNode {
            kind,
            name,
            start,
            end,
            parent: Some(parent),
            annotations,
        });
        id
    }
}

fn build(
    ast: &mut LegacyAst,
    node: tree_sitter::Node,
    source: &str,
    language: SourceLanguage,
    parent: LegacyNodeId,
) {
    let current = match map_kind(node.kind(), language) {
        Some(kind) => {
            let annotations = collect_annotations(&node, source, language);
            ast.push_node(
                parent,
                kind,
                declaration_name(&node, source),
                node.start_byte(),
                node.end_byte(),
                annotations,
            )
        }
        None => parent,
    };
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        build(ast, child, source, language, current);
    }
}

fn map_kind(kind: &str, language: SourceLanguage) -> Option<LegacyKind> {
    match language {
        SourceLanguage::Java => match kind {
            "class_declaration" | "interface_declaration" | "enum_declaration"
            | "record_declaration" | "annotation_type_declaration" => Some(LegacyKind::Class),
            "method_declaration" | "constructor_declaration" => Some(LegacyKind::Method),
            "annotation_type_element_declaration" => Some(LegacyKind::AnnotationMethod),
            "field_declaration" => Some(LegacyKind::Field),
            "local_variable_declaration" => Some(LegacyKind::Variable),
            _ => None,
        },
        SourceLanguage::Kotlin => match kind {
            "class_declaration" | "object_declaration" | "companion_object" => {
                Some(LegacyKind::Class)
            }
            "function_declaration" | "secondary_constructor" => Some(LegacyKind::Method),
            "property_declaration" => Some(LegacyKind::Variable),
            _ => None,
        },
    }
}

fn collect_annotations(
    node: &tree_sitter::Node,
    source: &str,
    language: SourceLanguage,
) -> Vec<LegacyAnnotation> {
    let pairs = match language {
        SourceLanguage::Java => super::java::annotations(node, source),
        SourceLanguage::Kotlin => super::kotlin::annotations(node, source),
    };
    pairs
        .into_iter()
        .map(|(name, values)| LegacyAnnotation { name, values })
        .collect()
}

fn declaration_name(node: &tree_sitter::Node, source: &str) -> Option<String> {
    if let Some(name) = node_field_text(node, "name", source) {
        return Some(name);
    }
    // Field and variable declarations keep their name on the declarator.
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "variable_declarator" {
            if let Some(name) = node_field_text(&child, "name", source) {
                return Some(name);
            }
        }
        if child.kind() == "identifier" {
            if let Ok(text) = child.utf8_text(source.as_bytes()) {
                return Some(text.to_string());
            }
        }
    }
    None
}
