//! Kotlin-specific grammar knowledge

use super::{find_child_by_kind, for_each_node};

const DECLARATION_KINDS: &[&str] = &[
    "property_declaration",
    "function_declaration",
    "secondary_constructor",
    "class_declaration",
    "object_declaration",
    "companion_object",
];

pub(crate) fn is_declaration(kind: &str) -> bool {
    DECLARATION_KINDS.contains(&kind)
}

/// All annotations on a declaration, as `(name, string_values)` pairs.
///
/// Kotlin annotations sit inside the declaration's `modifiers` child, either
/// as a bare `user_type` (`@JvmStatic`) or as a `constructor_invocation`
/// (`@Suppress("id")`).
pub(crate) fn annotations(node: &tree_sitter::Node, source: &str) -> Vec<(String, Vec<String>)> {
    let mut result = Vec::new();
    let Some(modifiers) = find_child_by_kind(node, "modifiers") else {
        return result;
    };
    let mut cursor = modifiers.walk();
    for child in modifiers.children(&mut cursor) {
        if child.kind() != "annotation" {
            continue;
        }
        let user_type = find_child_by_kind(&child, "user_type").or_else(|| {
            find_child_by_kind(&child, "constructor_invocation")
                .and_then(|inv| find_child_by_kind(&inv, "user_type"))
        });
        let Some(name) = user_type.and_then(|t| t.utf8_text(source.as_bytes()).ok()) else {
            continue;
        };
        let mut values = Vec::new();
        collect_string_literals(child, source, &mut values);
        result.push((name.to_string(), values));
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

/// Flatten every string literal in the annotation subtree. The annotation
/// name itself is a `user_type` and never contains strings, so scanning the
/// whole annotation node is safe.
fn collect_string_literals(node: tree_sitter::Node, source: &str, out: &mut Vec<String>) {
    for_each_node(node, &mut |n| {
        if n.kind().ends_with("string_literal") {
            if let Ok(text) = n.utf8_text(source.as_bytes()) {
                out.push(text.trim_matches('"').to_string());
            }
        }
    });
}
