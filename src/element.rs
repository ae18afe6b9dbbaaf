use crate::document::{Document, Node};
use crate::error::{Error, Result};
use indexmap::IndexMap;

/// Attributes keep the order they were read in, so a rewrite does not shuffle them.
pub type Attributes = IndexMap<String, String>;

#[derive(Debug)]
pub struct ElementData {
    full_name: String,
    attributes: Attributes,
    parent: Option<Element>,
    children: Vec<Node>,
}

/// Represents an Xml Element.
///
/// This struct only contains a unique usize id and implements trait `Copy`.
/// So you do not need to bother with having a reference.
///
/// Because the actual data of the element is stored in [`Document`],
/// most methods takes `&Document` or `&mut Document` as its first argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    id: usize,
}

impl Element {
    /// Create a new empty element with name.
    pub fn new<S: Into<String>>(doc: &mut Document, name: S) -> Element {
        Self::with_attributes(doc, name.into(), Attributes::new())
    }

    pub(crate) fn with_attributes(
        doc: &mut Document,
        full_name: String,
        attributes: Attributes,
    ) -> Element {
        let elem = Element { id: doc.counter };
        doc.store.push(ElementData {
            full_name,
            attributes,
            parent: None,
            children: vec![],
        });
        doc.counter += 1;
        elem
    }

    pub(crate) fn container() -> (Element, ElementData) {
        let elem_data = ElementData {
            full_name: String::new(),
            attributes: Attributes::new(),
            parent: None,
            children: Vec::new(),
        };
        (Element { id: 0 }, elem_data)
    }

    pub fn is_container(&self) -> bool {
        self.id == 0
    }
}

impl Element {
    fn data<'a>(&self, doc: &'a Document) -> &'a ElementData {
        &doc.store[self.id]
    }

    fn mut_data<'a>(&self, doc: &'a mut Document) -> &'a mut ElementData {
        &mut doc.store[self.id]
    }

    /// Raw tag name, including any `prefix:`.
    pub fn name<'a>(&self, doc: &'a Document) -> &'a str {
        &self.data(doc).full_name
    }

    pub fn attributes<'a>(&self, doc: &'a Document) -> &'a Attributes {
        &self.data(doc).attributes
    }

    pub fn mut_attributes<'a>(&self, doc: &'a mut Document) -> &'a mut Attributes {
        &mut self.mut_data(doc).attributes
    }

    pub fn attribute<'a>(&self, doc: &'a Document, name: &str) -> Option<&'a str> {
        self.attributes(doc).get(name).map(String::as_str)
    }

    /// Overwrites the attribute in place, or appends it if it was absent.
    /// Returns the previous value.
    pub fn set_attribute<N, V>(&self, doc: &mut Document, name: N, value: V) -> Option<String>
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.mut_attributes(doc).insert(name.into(), value.into())
    }

    pub fn parent(&self, doc: &Document) -> Option<Element> {
        self.data(doc).parent
    }

    pub fn children<'a>(&self, doc: &'a Document) -> &'a Vec<Node> {
        &self.data(doc).children
    }

    pub fn has_children(&self, doc: &Document) -> bool {
        !self.children(doc).is_empty()
    }

    pub fn child_elements(&self, doc: &Document) -> Vec<Element> {
        self.children(doc)
            .iter()
            .filter_map(|node| node.as_element())
            .collect()
    }

    /// Direct child elements named `tag`. Grandchildren are not visited.
    pub fn find_all(&self, doc: &Document, tag: &str) -> Vec<Element> {
        self.children(doc)
            .iter()
            .filter_map(|node| node.as_element())
            .filter(|elem| elem.name(doc) == tag)
            .collect()
    }

    /// Character data before the first child element.
    ///
    /// `<method group="g">verbose=3<extra/></method>` -> `Some("verbose=3")`.
    /// Returns `None` when there is no such text, or it is empty.
    pub fn text(&self, doc: &Document) -> Option<String> {
        let mut buf = String::new();
        for node in self.children(doc) {
            match node {
                Node::Text(text) | Node::CData(text) => buf.push_str(text),
                Node::Element(_) => break,
                _ => {}
            }
        }
        if buf.is_empty() {
            None
        } else {
            Some(buf)
        }
    }

    /// Replaces the leading character data with `text`. Child elements
    /// and anything after the first child element are kept.
    pub fn set_text<S: Into<String>>(&self, doc: &mut Document, text: S) {
        let children = &mut self.mut_data(doc).children;
        let leading = children
            .iter()
            .position(|node| matches!(node, Node::Element(_)))
            .unwrap_or(children.len());
        let mut pos = 0;
        children.retain(|node| {
            let stale = pos < leading && matches!(node, Node::Text(_) | Node::CData(_));
            pos += 1;
            !stale
        });
        children.insert(0, Node::Text(text.into()));
    }

    /// Equivalent to `vec.push()`.
    ///
    /// # Errors
    ///
    /// - [`Error::ContainerCannotMove`]: The container element cannot be a child.
    /// - [`Error::HasAParent`]: If node is an element, it must not have a parent.
    pub fn push_child(&self, doc: &mut Document, node: Node) -> Result<()> {
        if let Node::Element(elem) = node {
            if elem.is_container() {
                return Err(Error::ContainerCannotMove);
            }
            let data = elem.mut_data(doc);
            if data.parent.is_some() {
                return Err(Error::HasAParent);
            }
            data.parent = Some(*self);
        }
        self.mut_data(doc).children.push(node);
        Ok(())
    }
}
