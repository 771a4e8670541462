//! Detector trait and its capability roles
//!
//! A detector is a stateful object built from its issue's
//! [`Implementation`](crate::issue::Implementation) factory. The driver
//! constructs one instance per detector type per root project and keeps it
//! across phases, so state accumulated in phase 1 is visible in phase 2.
//! What a detector can scan is expressed through the `as_*` accessors: a
//! detector implements the matching scanner trait and overrides the
//! accessor to return itself.

use crate::context::{
    BinaryContext, ClassContext, Context, GradleContext, ResourceFolderContext, SourceContext,
    XmlContext,
};
use crate::dom::XmlElement;
use crate::parser::legacy::LegacyAst;
use crate::scope::ResourceFolderKind;
use tree_sitter::{Node, Tree};

/// Base lifecycle of every detector. All callbacks are optional.
pub trait Detector {
    /// Called once before any file of a project (main or library) is
    /// visited. The context's file is the project directory.
    fn before_check_project(&mut self, context: &mut Context<'_>) {
        let _ = context;
    }

    /// Called after the last file of the main project.
    fn after_check_project(&mut self, context: &mut Context<'_>) {
        let _ = context;
    }

    /// Called after the last file of each library project.
    fn after_check_library_project(&mut self, context: &mut Context<'_>) {
        let _ = context;
    }

    fn before_check_file(&mut self, context: &mut Context<'_>) {
        let _ = context;
    }

    fn after_check_file(&mut self, context: &mut Context<'_>) {
        let _ = context;
    }

    /// Raw whole-file hook, used for the proguard and property scopes where
    /// no richer representation exists. The contents are loaded.
    fn run(&mut self, context: &mut Context<'_>) {
        let _ = context;
    }

    fn as_xml_scanner(&mut self) -> Option<&mut dyn XmlScanner> {
        None
    }

    fn as_ast_scanner(&mut self) -> Option<&mut dyn AstScanner> {
        None
    }

    fn as_legacy_ast_scanner(&mut self) -> Option<&mut dyn LegacyAstScanner> {
        None
    }

    fn as_line_scanner(&mut self) -> Option<&mut dyn LineScanner> {
        None
    }

    fn as_class_scanner(&mut self) -> Option<&mut dyn ClassScanner> {
        None
    }

    fn as_gradle_scanner(&mut self) -> Option<&mut dyn GradleScanner> {
        None
    }

    fn as_binary_resource_scanner(&mut self) -> Option<&mut dyn BinaryResourceScanner> {
        None
    }

    fn as_resource_folder_scanner(&mut self) -> Option<&mut dyn ResourceFolderScanner> {
        None
    }

    fn as_other_file_scanner(&mut self) -> Option<&mut dyn OtherFileScanner> {
        None
    }
}

/// Scans manifest and resource XML documents.
pub trait XmlScanner {
    /// Gate for resource folders; the manifest is always visited. Defaults
    /// to every folder kind.
    fn applies_to(&self, folder: ResourceFolderKind) -> bool {
        let _ = folder;
        true
    }

    /// Element names [`visit_element`](Self::visit_element) should see;
    /// `None` means every element. Scanners that only need
    /// [`visit_document`](Self::visit_document) can leave both defaults.
    fn applicable_elements(&self) -> Option<&'static [&'static str]> {
        None
    }

    /// Called once per document, before any element.
    fn visit_document(&mut self, context: &mut XmlContext<'_>) {
        let _ = context;
    }

    /// Called per matching element in document order.
    fn visit_element(&mut self, context: &mut XmlContext<'_>, element: XmlElement<'_>) {
        let _ = (context, element);
    }
}

/// Scans parsed Java/Kotlin syntax trees.
pub trait AstScanner {
    /// Node kinds [`visit_node`](Self::visit_node) should see; `None` means
    /// every node.
    fn applicable_node_kinds(&self) -> Option<&'static [&'static str]> {
        None
    }

    /// Called once per file with the whole tree.
    fn visit_tree(&mut self, context: &mut SourceContext<'_>, tree: &Tree) {
        let _ = (context, tree);
    }

    /// Called per matching node in preorder.
    fn visit_node(&mut self, context: &mut SourceContext<'_>, node: Node<'_>) {
        let _ = (context, node);
    }
}

/// Deprecated source backend: the owned flat AST that predates the
/// tree-sitter integration. Detectors still on it keep working through a
/// compatibility pass, at the cost of an extra traversal per source file.
pub trait LegacyAstScanner {
    fn visit_unit(&mut self, context: &mut SourceContext<'_>, ast: &LegacyAst);
}

/// Deprecated source backend: raw per-line callbacks.
pub trait LineScanner {
    /// `number` is 0-based; `line` excludes the terminator.
    fn visit_line(&mut self, context: &mut SourceContext<'_>, number: usize, line: &str);
}

/// Scans the compiled-class model provided by the host.
pub trait ClassScanner {
    fn visit_class(&mut self, context: &mut ClassContext<'_>);
}

/// Scans Gradle build scripts as raw text.
pub trait GradleScanner {
    fn visit_build_script(&mut self, context: &mut GradleContext<'_>);
}

/// Scans non-XML resource files (bitmaps, raw assets).
pub trait BinaryResourceScanner {
    /// Gate for resource folders, like [`XmlScanner::applies_to`].
    fn applies_to(&self, folder: ResourceFolderKind) -> bool {
        let _ = folder;
        true
    }

    fn visit_binary_resource(&mut self, context: &mut BinaryContext<'_>);
}

/// Visited once per resource folder, before the files inside it.
pub trait ResourceFolderScanner {
    fn visit_resource_folder(&mut self, context: &mut ResourceFolderContext<'_>);
}

/// Catch-all over every file discovered for the project.
///
/// Registering for the `Other` scope forces the driver to discover
/// manifest, resource, source and class files even when no other scope
/// asks for them, so this is the most expensive scope to declare.
pub trait OtherFileScanner {
    fn visit_other_file(&mut self, context: &mut Context<'_>);
}
