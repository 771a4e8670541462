//! Detector-author scenarios run end to end: element spans, AST symbol
//! spans, suppression in both representations, and a cross-file
//! duplicate check.

use lintra_core::{
    AstScanner, Category, CollectingClient, Detector, Implementation, Issue, IssueRegistry,
    LintDriver, LintRequest, Location, Scope, ScopeSet, Severity, SourceContext, XmlContext,
    XmlElement, XmlScanner,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tempfile::TempDir;

struct Registry(Vec<&'static Issue>);

impl IssueRegistry for Registry {
    fn issues(&self) -> Vec<&'static Issue> {
        self.0.clone()
    }
}

fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

fn android_project() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "AndroidManifest.xml",
        "<manifest package=\"com.example.app\"/>",
    );
    let root = tmp.path().canonicalize().unwrap();
    (tmp, root)
}

fn run(issues: Vec<&'static Issue>, root: &Path) -> CollectingClient {
    let mut client = CollectingClient::new();
    {
        let mut driver = LintDriver::new(
            Box::new(Registry(issues)),
            &mut client,
            LintRequest::new(vec![root.to_path_buf()]),
        );
        driver.analyze().unwrap();
    }
    client
}

// Scrolling containers must not nest; the finding spans the inner element.

#[derive(Default)]
struct NestedScrollChecker;

static NESTED_SCROLL: LazyLock<Issue> = LazyLock::new(|| {
    Issue::create(
        "NestedScrolling",
        "Scrolling containers should not be nested",
        "A vertically scrolling container inside another one fights over \
         touch events and usually collapses to zero height.",
        Category::Correctness,
        Severity::Warning,
        Implementation::new::<NestedScrollChecker>(ScopeSet::of(Scope::ResourceFile)),
    )
});

impl Detector for NestedScrollChecker {
    fn as_xml_scanner(&mut self) -> Option<&mut dyn XmlScanner> {
        Some(self)
    }
}

impl XmlScanner for NestedScrollChecker {
    fn applicable_elements(&self) -> Option<&'static [&'static str]> {
        Some(&["ScrollView"])
    }

    fn visit_element(&mut self, ctx: &mut XmlContext<'_>, element: XmlElement<'_>) {
        let mut parent = element.parent();
        while let Some(ancestor) = parent {
            if ancestor.name() == "ScrollView" {
                let location = ctx.location(element);
                ctx.report(
                    &NESTED_SCROLL,
                    Some(element),
                    location,
                    "ScrollView nested inside another scrolling container",
                );
                return;
            }
            parent = ancestor.parent();
        }
    }
}

const NESTED_LAYOUT: &str = "\
<ScrollView xmlns:android=\"http://schemas.android.com/apk/res/android\">
    <LinearLayout>
        <ScrollView>
            <TextView android:text=\"hi\"/>
        </ScrollView>
    </LinearLayout>
</ScrollView>
";

#[test]
fn test_nested_scroll_finding_spans_the_inner_element() {
    let (_tmp, root) = android_project();
    let layout = write(&root, "res/layout/main.xml", NESTED_LAYOUT);

    let client = run(vec![&NESTED_SCROLL], &root);

    assert_eq!(client.findings.len(), 1);
    let location = &client.findings[0].location;
    assert_eq!(location.file, layout);

    let start = location.start.unwrap();
    let end = location.end.unwrap();
    assert_eq!(start.offset, NESTED_LAYOUT.find("<ScrollView>").unwrap());
    assert_eq!(start.line, 2);
    let span = &NESTED_LAYOUT[start.offset..end.offset];
    assert!(span.starts_with("<ScrollView>"));
    assert!(span.ends_with("</ScrollView>"));
    assert!(span.contains("TextView"));
}

// A source finding anchored on the method-name identifier.

#[derive(Default)]
struct DrawAllocationChecker;

static DRAW_WORK: LazyLock<Issue> = LazyLock::new(|| {
    Issue::create(
        "DrawWork",
        "Heavy work inside onDraw",
        "onDraw runs on every frame; move allocations and I/O out of it.",
        Category::Performance,
        Severity::Warning,
        Implementation::new::<DrawAllocationChecker>(ScopeSet::of(Scope::JavaFile)),
    )
});

impl Detector for DrawAllocationChecker {
    fn as_ast_scanner(&mut self) -> Option<&mut dyn AstScanner> {
        Some(self)
    }
}

impl AstScanner for DrawAllocationChecker {
    fn applicable_node_kinds(&self) -> Option<&'static [&'static str]> {
        Some(&["method_declaration"])
    }

    fn visit_node(&mut self, ctx: &mut SourceContext<'_>, node: tree_sitter::Node<'_>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        if ctx.text(name_node) == "onDraw" {
            let location = ctx.location(name_node);
            ctx.report(&DRAW_WORK, Some(node), location, "avoid work in onDraw");
        }
    }
}

const VIEW_SOURCE: &str = "\
package com.example;

class CustomView {
    void onDraw() {
        helper();
    }

    void helper() {
    }
}
";

#[test]
fn test_source_finding_spans_the_method_name() {
    let (_tmp, root) = android_project();
    let source = write(&root, "src/main/java/com/example/CustomView.java", VIEW_SOURCE);

    let client = run(vec![&DRAW_WORK], &root);

    assert_eq!(client.findings.len(), 1);
    let location = &client.findings[0].location;
    assert_eq!(location.file, source);

    let start = location.start.unwrap();
    let end = location.end.unwrap();
    assert_eq!(start.offset, VIEW_SOURCE.find("onDraw").unwrap());
    assert_eq!(end.offset - start.offset, "onDraw".len());
    assert_eq!(start.line, 3);
}

// Annotation suppression picks out individual issue ids.

#[derive(Default)]
struct ClassAuditor;

static UNSAFE_ALLOC: LazyLock<Issue> = LazyLock::new(|| {
    Issue::create(
        "UnsafeAlloc",
        "Suspicious allocation pattern",
        "Test scenario issue.",
        Category::Correctness,
        Severity::Warning,
        Implementation::new::<ClassAuditor>(ScopeSet::of(Scope::JavaFile)),
    )
});

static SLOW_CALL: LazyLock<Issue> = LazyLock::new(|| {
    Issue::create(
        "SlowCall",
        "Blocking call on a hot path",
        "Test scenario issue.",
        Category::Performance,
        Severity::Warning,
        Implementation::new::<ClassAuditor>(ScopeSet::of(Scope::JavaFile)),
    )
});

impl Detector for ClassAuditor {
    fn as_ast_scanner(&mut self) -> Option<&mut dyn AstScanner> {
        Some(self)
    }
}

impl AstScanner for ClassAuditor {
    fn applicable_node_kinds(&self) -> Option<&'static [&'static str]> {
        Some(&["class_declaration"])
    }

    fn visit_node(&mut self, ctx: &mut SourceContext<'_>, node: tree_sitter::Node<'_>) {
        let location = ctx.location(node);
        ctx.report(&UNSAFE_ALLOC, Some(node), location.clone(), "allocation");
        ctx.report(&SLOW_CALL, Some(node), location, "blocking call");
    }
}

#[test]
fn test_suppress_annotation_silences_only_the_named_issue() {
    let (_tmp, root) = android_project();
    write(
        &root,
        "src/main/java/com/example/App.java",
        "package com.example;\n\n@SuppressLint(\"UnsafeAlloc\")\nclass App {\n}\n",
    );

    let client = run(vec![&UNSAFE_ALLOC, &SLOW_CALL], &root);

    let issues: Vec<&str> = client.findings.iter().map(|f| f.issue.as_str()).collect();
    assert_eq!(issues, vec!["SlowCall"]);
}

// Marker comments suppress the next declaration.

#[derive(Default)]
struct MethodAuditor;

static BLOCKING_METHOD: LazyLock<Issue> = LazyLock::new(|| {
    Issue::create(
        "BlockingMethod",
        "Reports every method for the suppression scenario",
        "Test scenario issue.",
        Category::Performance,
        Severity::Warning,
        Implementation::new::<MethodAuditor>(ScopeSet::of(Scope::JavaFile)),
    )
});

impl Detector for MethodAuditor {
    fn as_ast_scanner(&mut self) -> Option<&mut dyn AstScanner> {
        Some(self)
    }
}

impl AstScanner for MethodAuditor {
    fn applicable_node_kinds(&self) -> Option<&'static [&'static str]> {
        Some(&["method_declaration"])
    }

    fn visit_node(&mut self, ctx: &mut SourceContext<'_>, node: tree_sitter::Node<'_>) {
        let name = node
            .child_by_field_name("name")
            .map(|n| ctx.text(n).to_string())
            .unwrap_or_default();
        let location = ctx.location(node);
        ctx.report(&BLOCKING_METHOD, Some(node), location, format!("method {}", name));
    }
}

#[test]
fn test_marker_comment_suppresses_the_next_declaration() {
    let (_tmp, root) = android_project();
    write(
        &root,
        "src/main/java/com/example/App.java",
        "package com.example;\n\nclass App {\n    //lintra-ignore BlockingMethod\n    void a() {\n    }\n\n    void b() {\n    }\n}\n",
    );

    let client = run(vec![&BLOCKING_METHOD], &root);

    let messages: Vec<&str> = client.findings.iter().map(|f| f.message.as_str()).collect();
    assert_eq!(messages, vec!["method b"]);
}

// The XML ignore attribute and marker comment, through the full pipeline.

#[derive(Default)]
struct HardcodedLabelChecker;

static HARDCODED_LABEL: LazyLock<Issue> = LazyLock::new(|| {
    Issue::create(
        "HardcodedLabel",
        "Text attributes should reference string resources",
        "Test scenario issue.",
        Category::Correctness,
        Severity::Warning,
        Implementation::new::<HardcodedLabelChecker>(ScopeSet::of(Scope::ResourceFile)),
    )
});

impl Detector for HardcodedLabelChecker {
    fn as_xml_scanner(&mut self) -> Option<&mut dyn XmlScanner> {
        Some(self)
    }
}

impl XmlScanner for HardcodedLabelChecker {
    fn applicable_elements(&self) -> Option<&'static [&'static str]> {
        Some(&["TextView"])
    }

    fn visit_element(&mut self, ctx: &mut XmlContext<'_>, element: XmlElement<'_>) {
        let Some(text) = element.attribute("android:text") else {
            return;
        };
        if text.starts_with("@string/") {
            return;
        }
        let location = ctx.location(element);
        let message = format!("hardcoded text \"{}\"", text);
        ctx.report(&HARDCODED_LABEL, Some(element), location, message);
    }
}

#[test]
fn test_ignore_attribute_suppresses_the_element() {
    let (_tmp, root) = android_project();
    write(
        &root,
        "res/layout/main.xml",
        "<LinearLayout xmlns:android=\"http://schemas.android.com/apk/res/android\"\n    \
         xmlns:lintra=\"http://schemas.example.com/tools\">\n    \
         <TextView android:text=\"Plain one\" lintra:ignore=\"HardcodedLabel\"/>\n    \
         <TextView android:text=\"Plain two\"/>\n</LinearLayout>\n",
    );

    let client = run(vec![&HARDCODED_LABEL], &root);

    let messages: Vec<&str> = client.findings.iter().map(|f| f.message.as_str()).collect();
    assert_eq!(messages, vec!["hardcoded text \"Plain two\""]);
}

#[test]
fn test_xml_marker_comment_suppresses_the_next_element() {
    let (_tmp, root) = android_project();
    write(
        &root,
        "res/layout/main.xml",
        "<LinearLayout xmlns:android=\"http://schemas.android.com/apk/res/android\">\n    \
         <!--lintra-ignore HardcodedLabel-->\n    \
         <TextView android:text=\"Plain one\"/>\n    \
         <TextView android:text=\"Plain two\"/>\n</LinearLayout>\n",
    );

    let client = run(vec![&HARDCODED_LABEL], &root);

    let messages: Vec<&str> = client.findings.iter().map(|f| f.message.as_str()).collect();
    assert_eq!(messages, vec!["hardcoded text \"Plain two\""]);
}

// Cross-file state: a duplicate-definition check over all resource files,
// with the first definition chained as a secondary location.

#[derive(Default)]
struct DuplicateStringChecker {
    seen: HashMap<String, Location>,
}

static DUPLICATE_STRING: LazyLock<Issue> = LazyLock::new(|| {
    Issue::create(
        "DuplicateString",
        "A string resource is defined more than once",
        "Test scenario issue.",
        Category::Correctness,
        Severity::Warning,
        Implementation::new::<DuplicateStringChecker>(ScopeSet::of(Scope::AllResourceFiles)),
    )
});

impl Detector for DuplicateStringChecker {
    fn as_xml_scanner(&mut self) -> Option<&mut dyn XmlScanner> {
        Some(self)
    }
}

impl XmlScanner for DuplicateStringChecker {
    fn applicable_elements(&self) -> Option<&'static [&'static str]> {
        Some(&["string"])
    }

    fn visit_element(&mut self, ctx: &mut XmlContext<'_>, element: XmlElement<'_>) {
        let Some(name) = element.attribute("name") else {
            return;
        };
        let location = ctx.location(element);
        if let Some(first) = self.seen.get(name) {
            let message = format!("{} is defined more than once", name);
            let location =
                location.with_secondary(first.clone().with_message("first defined here"));
            ctx.report(&DUPLICATE_STRING, Some(element), location, message);
        } else {
            self.seen.insert(name.to_string(), location);
        }
    }
}

#[test]
fn test_duplicate_definitions_chain_the_first_occurrence() {
    let (_tmp, root) = android_project();
    write(
        &root,
        "res/values/strings.xml",
        "<resources>\n    <string name=\"app_name\">Demo</string>\n    \
         <string name=\"title\">Title</string>\n</resources>\n",
    );
    write(
        &root,
        "res/values-en/strings.xml",
        "<resources>\n    <string name=\"app_name\">Demo EN</string>\n</resources>\n",
    );

    let client = run(vec![&DUPLICATE_STRING], &root);

    assert_eq!(client.findings.len(), 1);
    let finding = &client.findings[0];
    assert_eq!(finding.message, "app_name is defined more than once");
    assert!(finding.location.file.ends_with("res/values-en/strings.xml"));
    let secondary = finding.location.secondary.as_ref().unwrap();
    assert!(secondary.file.ends_with("res/values/strings.xml"));
    assert_eq!(secondary.message.as_deref(), Some("first defined here"));
}
