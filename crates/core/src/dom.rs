//! Positional XML DOM
//!
//! Detectors need two things from XML that plain event streams don't give
//! them: random-access navigation (parents, children, attributes) and byte
//! offsets for every element so findings can point at the exact tag. This
//! module materializes both from a single `quick-xml` event pass. Text
//! content is not retained; resource checks work on structure and attributes.

use crate::parser::ParseError;
use quick_xml::events::Event;
use quick_xml::Reader;

/// One attribute, with the raw (prefixed) name preserved, e.g.
/// `android:layout_width`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug)]
struct ElementData {
    name: String,
    attributes: Vec<XmlAttribute>,
    parent: Option<usize>,
    children: Vec<usize>,
    /// Byte offset of the opening `<`.
    start: usize,
    /// Byte offset just past the closing `>` of the end tag (or of `/>`).
    end: usize,
}

/// An XML document parsed into an element arena, in document order.
#[derive(Debug)]
pub struct XmlDocument {
    elements: Vec<ElementData>,
    root: Option<usize>,
}

impl XmlDocument {
    /// Parse a document, recording the byte span of every element.
    pub fn parse(source: &str) -> Result<XmlDocument, ParseError> {
        let mut reader = Reader::from_str(source);
        let mut elements: Vec<ElementData> = Vec::new();
        let mut stack: Vec<usize> = Vec::new();
        let mut root = None;

        loop {
            // Position before the event is the offset of its leading '<'.
            let start = reader.buffer_position() as usize;
            match reader.read_event() {
                Ok(Event::Start(tag)) => {
                    let index = push_element(&mut elements, &stack, &tag, start)?;
                    if root.is_none() {
                        root = Some(index);
                    }
                    stack.push(index);
                }
                Ok(Event::Empty(tag)) => {
                    let index = push_element(&mut elements, &stack, &tag, start)?;
                    if root.is_none() {
                        root = Some(index);
                    }
                    elements[index].end = reader.buffer_position() as usize;
                }
                Ok(Event::End(_)) => {
                    if let Some(index) = stack.pop() {
                        elements[index].end = reader.buffer_position() as usize;
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(ParseError::Xml(e.to_string())),
            }
        }

        Ok(XmlDocument { elements, root })
    }

    /// The document element, if the file contained one.
    pub fn root_element(&self) -> Option<XmlElement<'_>> {
        self.root.map(|index| XmlElement {
            document: self,
            index,
        })
    }

    /// All elements, in document order.
    pub fn iter_elements(&self) -> impl Iterator<Item = XmlElement<'_>> {
        (0..self.elements.len()).map(move |index| XmlElement {
            document: self,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

fn push_element(
    elements: &mut Vec<ElementData>,
    stack: &[usize],
    tag: &quick_xml::events::BytesStart<'_>,
    start: usize,
) -> Result<usize, ParseError> {
    let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in tag.attributes() {
        let attr = attr.map_err(|e| ParseError::Xml(e.to_string()))?;
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        attributes.push(XmlAttribute {
            name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value,
        });
    }

    let parent = stack.last().copied();
    let index = elements.len();
    elements.push(ElementData {
        name,
        attributes,
        parent,
        children: Vec::new(),
        start,
        end: start,
    });
    if let Some(parent) = parent {
        elements[parent].children.push(index);
    }
    Ok(index)
}

/// A lightweight handle to one element of an [`XmlDocument`].
#[derive(Clone, Copy)]
pub struct XmlElement<'a> {
    document: &'a XmlDocument,
    index: usize,
}

impl<'a> XmlElement<'a> {
    fn data(&self) -> &'a ElementData {
        &self.document.elements[self.index]
    }

    /// Tag name, with any namespace prefix intact.
    pub fn name(&self) -> &'a str {
        &self.data().name
    }

    /// Attribute value by raw name (`android:id`, `lintra:ignore`, ...).
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.data()
            .attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn attributes(&self) -> &'a [XmlAttribute] {
        &self.data().attributes
    }

    pub fn parent(&self) -> Option<XmlElement<'a>> {
        self.data().parent.map(|index| XmlElement {
            document: self.document,
            index,
        })
    }

    pub fn children(&self) -> impl Iterator<Item = XmlElement<'a>> + 'a {
        let document = self.document;
        self.data()
            .children
            .iter()
            .map(move |&index| XmlElement { document, index })
    }

    /// Byte offset of the element's opening `<`.
    pub fn start_offset(&self) -> usize {
        self.data().start
    }

    /// Byte offset just past the element's closing tag.
    pub fn end_offset(&self) -> usize {
        self.data().end
    }
}

impl std::fmt::Debug for XmlElement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlElement")
            .field("name", &self.name())
            .field("start", &self.start_offset())
            .field("end", &self.end_offset())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_point_at_tags() {
        let source = "<root>\n  <child attr=\"x\"/>\n</root>\n";
        let doc = XmlDocument::parse(source).unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(root.name(), "root");
        assert_eq!(root.start_offset(), 0);

        let child = root.children().next().unwrap();
        assert_eq!(child.name(), "child");
        assert_eq!(&source[child.start_offset()..child.start_offset() + 6], "<child");
        assert_eq!(child.attribute("attr"), Some("x"));
        assert_eq!(child.parent().unwrap().name(), "root");
    }

    #[test]
    fn document_order_iteration() {
        let doc = XmlDocument::parse("<a><b/><c><d/></c></a>").unwrap();
        let names: Vec<&str> = doc.iter_elements().map(|e| e.name()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }
}
