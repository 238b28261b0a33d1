//! XML data model

use indexmap::IndexMap;

/// XML document
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    pub root: Element,
}

/// XML element
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Content>,
}

/// XML content node
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Content {
    Element(Element),
    Text(String),
    Comment(String),
}

impl Content {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder-style child element
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(Content::Element(child));
        self
    }

    /// Builder-style text node
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Content::Text(text.into()));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Set or overwrite an attribute, keeping its position when it exists
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn push(&mut self, child: Self) {
        self.children.push(Content::Element(child));
    }

    /// Child elements, skipping text and comments
    pub fn child_elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(Content::as_element)
    }

    /// First element child; comments and text are skipped
    pub fn first_element(&self) -> Option<&Self> {
        self.child_elements().next()
    }

    pub fn has_child_elements(&self) -> bool {
        self.child_elements().next().is_some()
    }

    /// First child element with the given tag
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.child_elements().find(|c| c.name == name)
    }

    /// Concatenated text of the direct text children
    pub fn text(&self) -> Option<String> {
        let mut out = String::new();
        let mut found = false;
        for child in &self.children {
            if let Content::Text(text) = child {
                out.push_str(text);
                found = true;
            }
        }
        found.then_some(out)
    }

    /// Tag name plus exact attribute-set equality
    pub fn same_identity(&self, other: &Self) -> bool {
        self.name == other.name && self.attributes == other.attributes
    }

    /// Every attribute of `pattern` is present here with the same value
    pub fn has_attributes_of(&self, pattern: &IndexMap<String, String>) -> bool {
        pattern
            .iter()
            .all(|(k, v)| self.attributes.get(k).is_some_and(|own| own == v))
    }

    /// Number of elements in this subtree, including self
    pub fn element_count(&self) -> usize {
        1 + self
            .child_elements()
            .map(Self::element_count)
            .sum::<usize>()
    }
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_attribute_order() {
        let a = Element::new("repository")
            .with_attr("type", "rpm-md")
            .with_attr("alias", "main");
        let b = Element::new("repository")
            .with_attr("alias", "main")
            .with_attr("type", "rpm-md");
        assert!(a.same_identity(&b));
        assert!(!a.same_identity(&Element::new("repository")));
    }

    #[test]
    fn test_has_attributes_of_is_partial() {
        let repo = Element::new("repository")
            .with_attr("type", "rpm-md")
            .with_attr("alias", "main");
        let mut glob = IndexMap::new();
        assert!(repo.has_attributes_of(&glob));
        glob.insert("type".to_string(), "rpm-md".to_string());
        assert!(repo.has_attributes_of(&glob));
        glob.insert("priority".to_string(), "1".to_string());
        assert!(!repo.has_attributes_of(&glob));
    }

    #[test]
    fn test_first_element_skips_comments() {
        let op = Element {
            name: "merge".to_string(),
            attributes: IndexMap::new(),
            children: vec![
                Content::Comment(" preferences ".to_string()),
                Content::Text("\n".to_string()),
                Content::Element(Element::new("preferences")),
            ],
        };
        assert_eq!(op.first_element().map(|e| e.name.as_str()), Some("preferences"));
    }

    #[test]
    fn test_text_joins_text_nodes() {
        let el = Element::new("set").with_text("a: 1").with_text("\nb: 2");
        assert_eq!(el.text().as_deref(), Some("a: 1\nb: 2"));
        assert_eq!(Element::new("set").text(), None);
    }

    #[test]
    fn test_element_count() {
        let tree = Element::new("image").with_child(
            Element::new("packages")
                .with_child(Element::new("package"))
                .with_child(Element::new("package")),
        );
        assert_eq!(tree.element_count(), 4);
    }
}
