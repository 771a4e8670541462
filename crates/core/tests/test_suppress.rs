//! Tests for suppression resolution across the analyzed representations

use lintra_core::parser::legacy::{LegacyAnnotation, LegacyAst, LegacyKind};
use lintra_core::suppress::{self, SourceNode};
use lintra_core::{AnnotationInfo, ClassInfo, ClassNode, MethodInfo, SourceLanguage, SourceParser, XmlDocument};

fn collect_nodes<'a>(node: tree_sitter::Node<'a>, kind: &str, out: &mut Vec<tree_sitter::Node<'a>>) {
    if node.kind() == kind {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_nodes(child, kind, out);
    }
}

#[test]
fn test_java_annotation_on_enclosing_method() {
    let source = r#"class App {
    @SuppressLint("MyId")
    void annotated() {
        int x = compute();
    }

    void bare() {
        int y = compute();
    }
}
"#;
    let parser = SourceParser::new();
    let tree = parser.parse(source, SourceLanguage::Java).unwrap();
    let mut calls = Vec::new();
    collect_nodes(tree.root_node(), "method_invocation", &mut calls);
    assert_eq!(calls.len(), 2);

    let in_annotated = SourceNode::Ast {
        node: calls[0],
        source,
        language: SourceLanguage::Java,
    };
    let in_bare = SourceNode::Ast {
        node: calls[1],
        source,
        language: SourceLanguage::Java,
    };

    assert!(suppress::is_suppressed("MyId", &in_annotated));
    assert!(!suppress::is_suppressed("OtherId", &in_annotated));
    assert!(!suppress::is_suppressed("MyId", &in_bare));
}

#[test]
fn test_java_annotation_on_enclosing_class() {
    let source = r#"@SuppressWarnings("LintraClassWide")
class App {
    void any() {
        int x = compute();
    }
}
"#;
    let parser = SourceParser::new();
    let tree = parser.parse(source, SourceLanguage::Java).unwrap();
    let mut calls = Vec::new();
    collect_nodes(tree.root_node(), "method_invocation", &mut calls);

    let node = SourceNode::Ast {
        node: calls[0],
        source,
        language: SourceLanguage::Java,
    };
    // The IDE prefix form counts as naming the issue.
    assert!(suppress::is_suppressed("ClassWide", &node));
    assert!(!suppress::is_suppressed("SomethingElse", &node));
}

#[test]
fn test_kotlin_annotation_on_function() {
    let source = "class App {\n    @Suppress(\"MyId\")\n    fun annotated() {\n    }\n}\n";
    let parser = SourceParser::new();
    let tree = parser.parse(source, SourceLanguage::Kotlin).unwrap();
    let mut functions = Vec::new();
    collect_nodes(tree.root_node(), "function_declaration", &mut functions);
    assert_eq!(functions.len(), 1);

    let node = SourceNode::Ast {
        node: functions[0],
        source,
        language: SourceLanguage::Kotlin,
    };
    assert!(suppress::is_suppressed("MyId", &node));
    assert!(!suppress::is_suppressed("OtherId", &node));
}

#[test]
fn test_xml_ignore_attribute_on_ancestor() {
    let source = r#"<LinearLayout xmlns:lintra="http://schemas.android.com/tools" lintra:ignore="NestedWeights, Overdraw">
    <FrameLayout>
        <TextView/>
    </FrameLayout>
</LinearLayout>
"#;
    let document = XmlDocument::parse(source).unwrap();
    let text_view = document
        .iter_elements()
        .find(|e| e.name() == "TextView")
        .unwrap();

    assert!(suppress::is_suppressed("NestedWeights", &SourceNode::Xml(text_view)));
    assert!(suppress::is_suppressed("Overdraw", &SourceNode::Xml(text_view)));
    assert!(!suppress::is_suppressed("HardcodedText", &SourceNode::Xml(text_view)));
}

#[test]
fn test_class_annotation_direct_and_outer() {
    let mut outer = ClassInfo::new("com/example/Outer");
    outer
        .annotations
        .push(AnnotationInfo::new("SuppressLint", vec!["OuterId".to_string()]));

    let inner = ClassInfo::new("com/example/Outer$Inner");
    let outers = [&outer];
    let node = SourceNode::Class(ClassNode {
        class: &inner,
        member: None,
        outer: &outers,
    });

    assert!(suppress::is_suppressed("OuterId", &node));
    assert!(!suppress::is_suppressed("InnerOnly", &node));
}

#[test]
fn test_class_member_annotation() {
    let mut class = ClassInfo::new("com/example/App");
    let mut method = MethodInfo::new("onDraw", "()V");
    method.annotations.push(AnnotationInfo::new(
        "Landroid/annotation/SuppressLint;",
        vec!["DrawAllocation".to_string()],
    ));
    class.methods.push(method);

    let node = SourceNode::Class(ClassNode {
        class: &class,
        member: Some(lintra_core::ClassMember::Method(&class.methods[0])),
        outer: &[],
    });
    assert!(suppress::is_suppressed("DrawAllocation", &node));

    let class_only = SourceNode::Class(ClassNode {
        class: &class,
        member: None,
        outer: &[],
    });
    assert!(!suppress::is_suppressed("DrawAllocation", &class_only));
}

#[test]
fn test_anonymous_class_inherits_from_constructing_method() {
    let mut outer = ClassInfo::new("com/example/App");
    let mut factory = MethodInfo::new("makeRunnable", "()Ljava/lang/Runnable;");
    factory
        .annotations
        .push(AnnotationInfo::new("SuppressLint", vec!["NewApi".to_string()]));
    factory.new_instances.push("com/example/App$1".to_string());
    outer.methods.push(factory);

    let anonymous = ClassInfo::new("com/example/App$1");
    let outers = [&outer];
    let node = SourceNode::Class(ClassNode {
        class: &anonymous,
        member: None,
        outer: &outers,
    });

    assert!(suppress::is_suppressed("NewApi", &node));
    assert!(!suppress::is_suppressed("OtherId", &node));

    // A named inner class does not inherit the method-level suppression.
    let named = ClassInfo::new("com/example/App$Named");
    let node = SourceNode::Class(ClassNode {
        class: &named,
        member: None,
        outer: &outers,
    });
    assert!(!suppress::is_suppressed("NewApi", &node));
}

#[test]
fn test_legacy_ast_walks_enclosing_declarations() {
    let mut ast = LegacyAst::new();
    let class = ast.push_node(
        ast.root(),
        LegacyKind::Class,
        Some("App".to_string()),
        0,
        200,
        vec![LegacyAnnotation {
            name: "android.annotation.SuppressLint".to_string(),
            values: vec!["ClassWide".to_string()],
        }],
    );
    let method = ast.push_node(class, LegacyKind::Method, Some("run".to_string()), 20, 180, vec![]);

    let node = SourceNode::Legacy { ast: &ast, node: method };
    assert!(suppress::is_suppressed("ClassWide", &node));
    assert!(!suppress::is_suppressed("MethodLocal", &node));
}

#[test]
fn test_start_offsets_by_representation() {
    let source = "<a><b/></a>";
    let document = XmlDocument::parse(source).unwrap();
    let b = document.iter_elements().find(|e| e.name() == "b").unwrap();
    assert_eq!(SourceNode::Xml(b).start_offset(), Some(3));

    let class = ClassInfo::new("com/example/App");
    let node = SourceNode::Class(ClassNode {
        class: &class,
        member: None,
        outer: &[],
    });
    assert_eq!(node.start_offset(), None);
}
