// Copyright 2024 XMapper Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Location patterns used by bindings
//!
//! Grammar: `segment ("/" segment)* ["@" attribute]`, where the attribute
//! may also be given as its own last segment (`a/b/@id`). An empty pattern
//! or `.` designates the element the binding is applied to.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::Element;
use crate::error::{MappingError, MappingResult};

/// Compiled location pattern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    pattern: String,
    segments: Vec<String>,
    attribute: Option<String>,
}

impl Path {
    /// Compile `pattern`
    pub fn parse(pattern: &str) -> MappingResult<Self> {
        let invalid = |message: &str| MappingError::InvalidPath {
            pattern: pattern.to_string(),
            message: message.to_string(),
        };

        let mut segments = Vec::new();
        let mut attribute = None;
        let parts: Vec<&str> = pattern.trim().split('/').collect();
        let last = parts.len() - 1;

        for (index, part) in parts.into_iter().enumerate() {
            if part.is_empty() || part == "." {
                continue;
            }
            let (segment, attr) = match part.split_once('@') {
                Some((segment, attr)) => (segment, Some(attr)),
                None => (part, None),
            };
            if let Some(attr) = attr {
                if index != last {
                    return Err(invalid("attribute must be the last step"));
                }
                if attr.is_empty() || attr.contains('@') {
                    return Err(invalid("malformed attribute name"));
                }
                attribute = Some(attr.to_string());
            }
            if !segment.is_empty() {
                segments.push(segment.to_string());
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            attribute,
        })
    }

    /// Pattern as written
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Element steps
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Attribute step, if the pattern ends in one
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// Check if the pattern designates the context element itself
    pub fn is_self(&self) -> bool {
        self.segments.is_empty() && self.attribute.is_none()
    }

    /// First element matching the element steps
    pub fn select_first(&self, element: &Arc<Element>) -> Option<Arc<Element>> {
        let mut current = element.clone();
        for segment in &self.segments {
            let next = current.children_named(segment).next()?.clone();
            current = next;
        }
        Some(current)
    }

    /// All elements matching the element steps, in document order
    pub fn select_all(&self, element: &Arc<Element>) -> Vec<Arc<Element>> {
        let mut current = vec![element.clone()];
        for segment in &self.segments {
            current = current
                .iter()
                .flat_map(|el| el.children_named(segment).cloned().collect::<Vec<_>>())
                .collect();
        }
        current
    }

    /// Text at the first match: the attribute value, or the element text
    pub fn select_text(&self, element: &Arc<Element>, trim: bool) -> Option<String> {
        let target = self.select_first(element)?;
        self.text_at(&target, trim)
    }

    /// Text at every match, in document order
    pub fn select_texts(&self, element: &Arc<Element>, trim: bool) -> Vec<String> {
        self.select_all(element)
            .iter()
            .filter_map(|target| self.text_at(target, trim))
            .collect()
    }

    /// Text of an already selected element: the attribute value, or the element text
    pub fn text_at(&self, element: &Element, trim: bool) -> Option<String> {
        match self.attribute.as_deref() {
            Some(name) => element.attribute(name).map(str::to_string),
            None => {
                let text = element.text_content();
                Some(if trim { text.trim().to_string() } else { text })
            }
        }
    }
}

impl FromStr for Path {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Arc<Element> {
        Element::parse(
            r#"<contrib name="c1">
                 <service class="a.Service"> a.Service </service>
                 <group><item id="1">one</item><item id="2">two</item></group>
                 <group><item id="3">three</item></group>
               </contrib>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_patterns() {
        let path = Path::parse("group/item@id").unwrap();
        assert_eq!(path.segments(), ["group", "item"]);
        assert_eq!(path.attribute(), Some("id"));

        let path = Path::parse("group/item/@id").unwrap();
        assert_eq!(path.segments(), ["group", "item"]);
        assert_eq!(path.attribute(), Some("id"));

        let path = Path::parse("@name").unwrap();
        assert!(path.segments().is_empty());
        assert_eq!(path.attribute(), Some("name"));

        assert!(Path::parse(".").unwrap().is_self());
        assert!(Path::parse("").unwrap().is_self());
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(Path::parse("a@x/b").is_err());
        assert!(Path::parse("a@").is_err());
        assert!(Path::parse("a@b@c").is_err());
    }

    #[test]
    fn test_select_text() {
        let root = doc();
        let path = Path::parse("service").unwrap();
        assert_eq!(path.select_text(&root, true).as_deref(), Some("a.Service"));
        assert_eq!(path.select_text(&root, false).as_deref(), Some(" a.Service "));

        let path = Path::parse("service@class").unwrap();
        assert_eq!(path.select_text(&root, true).as_deref(), Some("a.Service"));

        assert_eq!(Path::parse("@name").unwrap().select_text(&root, true).as_deref(), Some("c1"));
        assert_eq!(Path::parse("@missing").unwrap().select_text(&root, true), None);
        assert_eq!(Path::parse("nothing").unwrap().select_text(&root, true), None);
    }

    #[test]
    fn test_select_all_in_document_order() {
        let root = doc();
        let path = Path::parse("group/item").unwrap();
        assert_eq!(path.select_all(&root).len(), 3);
        assert_eq!(path.select_texts(&root, true), vec!["one", "two", "three"]);

        let path = Path::parse("group/item@id").unwrap();
        assert_eq!(path.select_texts(&root, true), vec!["1", "2", "3"]);

        let first = Path::parse("group/item").unwrap().select_first(&root).unwrap();
        assert_eq!(first.attribute("id"), Some("1"));
    }
}
