//! Java-specific grammar knowledge

use super::{find_child_by_kind, for_each_node, node_field_text};

/// Node kinds that count as declarations for suppression walks. Order is
/// roughly innermost to outermost, but membership is all that matters.
const DECLARATION_KINDS: &[&str] = &[
    "local_variable_declaration",
    "field_declaration",
    "method_declaration",
    "constructor_declaration",
    "annotation_type_element_declaration",
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
];

pub(crate) fn is_declaration(kind: &str) -> bool {
    DECLARATION_KINDS.contains(&kind)
}

/// All annotations on a declaration, as `(name, string_values)` pairs.
///
/// String values are flattened out of the argument list, including array
/// initializers, so `@SuppressWarnings({"A", "B"})` yields both ids.
pub(crate) fn annotations(node: &tree_sitter::Node, source: &str) -> Vec<(String, Vec<String>)> {
    let mut result = Vec::new();
    let Some(modifiers) = find_child_by_kind(node, "modifiers") else {
        return result;
    };
    let mut cursor = modifiers.walk();
    for child in modifiers.children(&mut cursor) {
        if child.kind() != "annotation" && child.kind() != "marker_annotation" {
            continue;
        }
        let Some(name) = node_field_text(&child, "name", source) else {
            continue;
        };
        let mut values = Vec::new();
        if let Some(arguments) = child.child_by_field_name("arguments") {
            collect_string_literals(arguments, source, &mut values);
        }
        result.push((name, values));
    }
    result
}

/// Collect suppression annotation values declared on `node`.
pub(crate) fn suppression_values(node: &tree_sitter::Node, source: &str, out: &mut Vec<String>) {
    for (name, values) in annotations(node, source) {
        if crate::suppress::is_suppression_annotation(&name) {
            out.extend(values);
        }
    }
}

fn collect_string_literals(node: tree_sitter::Node, source: &str, out: &mut Vec<String>) {
    for_each_node(node, &mut |n| {
        if n.kind() == "string_literal" {
            if let Ok(text) = n.utf8_text(source.as_bytes()) {
                out.push(text.trim_matches('"').to_string());
            }
        }
    });
}
