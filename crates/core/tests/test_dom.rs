//! Tests for the offset-preserving XML document model

use lintra_core::XmlDocument;

const LAYOUT: &str = r#"<LinearLayout xmlns:android="http://schemas.android.com/apk/res/android"
    android:orientation="vertical">
    <!-- header -->
    <TextView android:id="@+id/title" android:text="Hello"/>
    <ScrollView>
        <TextView android:id="@+id/body"/>
    </ScrollView>
</LinearLayout>
"#;

#[test]
fn test_root_element() {
    let document = XmlDocument::parse(LAYOUT).unwrap();
    let root = document.root_element().unwrap();
    assert_eq!(root.name(), "LinearLayout");
    assert_eq!(root.attribute("android:orientation"), Some("vertical"));
    assert!(root.parent().is_none());
}

#[test]
fn test_document_order_iteration() {
    let document = XmlDocument::parse(LAYOUT).unwrap();
    let names: Vec<&str> = document.iter_elements().map(|e| e.name()).collect();
    assert_eq!(
        names,
        vec!["LinearLayout", "TextView", "ScrollView", "TextView"]
    );
    assert_eq!(document.len(), 4);
    assert!(!document.is_empty());
}

#[test]
fn test_parent_and_children() {
    let document = XmlDocument::parse(LAYOUT).unwrap();
    let root = document.root_element().unwrap();

    let children: Vec<&str> = root.children().map(|c| c.name()).collect();
    assert_eq!(children, vec!["TextView", "ScrollView"]);

    let scroll = root.children().find(|c| c.name() == "ScrollView").unwrap();
    let inner = scroll.children().next().unwrap();
    assert_eq!(inner.attribute("android:id"), Some("@+id/body"));
    assert_eq!(inner.parent().unwrap().name(), "ScrollView");
    assert_eq!(inner.parent().unwrap().parent().unwrap().name(), "LinearLayout");
}

#[test]
fn test_element_offsets_point_at_tags() {
    let document = XmlDocument::parse(LAYOUT).unwrap();
    let scroll = document
        .iter_elements()
        .find(|e| e.name() == "ScrollView")
        .unwrap();

    let start = scroll.start_offset();
    assert_eq!(&LAYOUT[start..start + "<ScrollView".len()], "<ScrollView");

    let end = scroll.end_offset();
    assert!(LAYOUT[..end].ends_with("</ScrollView>"));
}

#[test]
fn test_self_closing_element_offsets() {
    let document = XmlDocument::parse(LAYOUT).unwrap();
    let title = document
        .iter_elements()
        .find(|e| e.attribute("android:id") == Some("@+id/title"))
        .unwrap();

    let start = title.start_offset();
    let end = title.end_offset();
    assert_eq!(&LAYOUT[start..start + 9], "<TextView");
    assert!(LAYOUT[..end].ends_with("/>"));
}

#[test]
fn test_attributes_listed_in_order() {
    let document = XmlDocument::parse(LAYOUT).unwrap();
    let title = document
        .iter_elements()
        .find(|e| e.attribute("android:id") == Some("@+id/title"))
        .unwrap();

    let names: Vec<&str> = title.attributes().iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["android:id", "android:text"]);
    assert_eq!(title.attribute("android:missing"), None);
}

#[test]
fn test_malformed_document_is_an_error() {
    assert!(XmlDocument::parse("<a><b></a>").is_err());
    assert!(XmlDocument::parse("not xml at all <").is_err());
}

#[test]
fn test_empty_document() {
    let document = XmlDocument::parse("<!-- nothing here -->").unwrap();
    assert!(document.root_element().is_none());
    assert!(document.is_empty());
}
