//! Owned XML element tree
//!
//! Documents are parsed with `roxmltree` and copied into reference-counted
//! elements, so a deferred binding can keep the element it was applied to
//! after the source text is gone. Element names are local names; namespaces
//! are ignored.

pub mod path;

pub use path::Path;

use std::sync::Arc;

use crate::error::MappingResult;

/// Child of an element
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Nested element
    Element(Arc<Element>),
    /// Character data
    Text(String),
}

/// Immutable XML element
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an element without attributes or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Append a child element
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(Arc::new(child)));
        self
    }

    /// Append character data
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Parse a document and return its root element
    pub fn parse(xml: &str) -> MappingResult<Arc<Element>> {
        let document = roxmltree::Document::parse(xml)?;
        Ok(Arc::new(Self::from_node(document.root_element())))
    }

    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let attributes = node
            .attributes()
            .map(|attr| (attr.name().to_string(), attr.value().to_string()))
            .collect();

        let children = node
            .children()
            .filter_map(|child| {
                if child.is_element() {
                    Some(Node::Element(Arc::new(Self::from_node(child))))
                } else if child.is_text() {
                    child.text().map(|text| Node::Text(text.to_string()))
                } else {
                    None
                }
            })
            .collect();

        Self {
            name: node.tag_name().name().to_string(),
            attributes,
            children,
        }
    }

    /// Local name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the attribute `name`
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All attributes in document order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// All children in document order
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements in document order
    pub fn child_elements(&self) -> impl Iterator<Item = &Arc<Element>> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Child elements named `name`
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Arc<Element>> {
        self.child_elements().filter(move |child| child.name == name)
    }

    /// Concatenated text of all descendants
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Visit this element and its descendants depth-first, stopping descent
    /// below elements for which `visit` returns `false`
    pub fn walk(self: &Arc<Self>, visit: &mut impl FnMut(&Arc<Element>) -> bool) {
        if visit(self) {
            for child in self.child_elements() {
                child.walk(visit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<contrib component="org.example.Component">
  <service>org.example.Service</service>
  <extension extend="org.example.A"/>
  <!-- skipped -->
  <extension extend="org.example.B">note <b>bold</b></extension>
</contrib>"#;

    #[test]
    fn test_parse_document() {
        let root = Element::parse(DOC).unwrap();
        assert_eq!(root.name(), "contrib");
        assert_eq!(root.attribute("component"), Some("org.example.Component"));
        assert_eq!(root.attribute("missing"), None);
        assert_eq!(root.child_elements().count(), 3);
        assert_eq!(root.children_named("extension").count(), 2);
    }

    #[test]
    fn test_text_content() {
        let root = Element::parse(DOC).unwrap();
        let last = root.children_named("extension").nth(1).unwrap();
        assert_eq!(last.text_content(), "note bold");
        let service = root.children_named("service").next().unwrap();
        assert_eq!(service.text_content(), "org.example.Service");
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Element::parse("<open>"),
            Err(crate::error::MappingError::Xml(_))
        ));
    }

    #[test]
    fn test_builder_and_walk() {
        let root = Arc::new(
            Element::new("a")
                .with_child(Element::new("b").with_child(Element::new("c")))
                .with_child(Element::new("d").with_text("x")),
        );
        let mut names = Vec::new();
        root.walk(&mut |el| {
            names.push(el.name().to_string());
            el.name() != "b"
        });
        assert_eq!(names, vec!["a", "b", "d"]);
    }
}
