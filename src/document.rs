use crate::element::{Element, ElementData};
use crate::error::{Error, Result};
use crate::parser::DocumentParser;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use std::str::FromStr;

/// Options for parsing xml.
///
/// `empty_text_node`: <tag></tag> will have a Node::Text("") as its children, while <tag /> won't.
///
/// `trim_text`: Trims leading and ending whitespaces in `Node::Text`.
/// Off by default: params may carry meaningful whitespace.
///
/// `ignore_whitespace_only`: Drops text nodes that are whitespace only.
/// Off by default, so the input's layout is written back as it was.
///
/// `require_decl`: Returns error if the document doesn't start with an XML declaration.
/// Config files often omit it, so it is off by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    pub empty_text_node: bool,
    pub trim_text: bool,
    pub ignore_whitespace_only: bool,
    pub require_decl: bool,
}

impl Default for ReadOptions {
    fn default() -> ReadOptions {
        ReadOptions {
            empty_text_node: true,
            trim_text: false,
            ignore_whitespace_only: false,
            require_decl: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
    CData(String),
    PI(String),
    DocType(String),
}

impl Node {
    pub fn as_element(&self) -> Option<Element> {
        match self {
            Self::Element(elem) => Some(*elem),
            _ => None,
        }
    }
}

/// Represents a XML document.
///
/// # Examples
/// ```
/// use config_patcher::Document;
///
/// let mut doc = Document::parse_str(
///     r#"<config><method group="READ_METHOD" method="BP">verbose=3</method></config>"#,
/// ).unwrap();
/// let method = doc.root_element().unwrap().find_all(&doc, "method")[0];
/// method.set_attribute(&mut doc, "method", "MPI");
/// method.set_text(&mut doc, "verbose=1");
/// let xml = doc.write_str().unwrap();
/// assert!(xml.contains(r#"<method group="READ_METHOD" method="MPI">verbose=1</method>"#));
/// ```
#[derive(Debug)]
pub struct Document {
    pub(crate) counter: usize, // == self.store.len()
    pub(crate) store: Vec<ElementData>,
    container: Element,

    pub(crate) version: String,
    pub(crate) standalone: bool,
}

impl Document {
    /// Create a blank new xml document.
    pub fn new() -> Document {
        let (container, container_data) = Element::container();
        Document {
            counter: 1, // because container is id 0
            store: vec![container_data],
            container,
            version: String::new(),
            standalone: false,
        }
    }

    /// Invisible element holding the top level nodes.
    pub fn container(&self) -> Element {
        self.container
    }

    pub fn is_empty(&self) -> bool {
        self.store.len() == 1
    }

    /// Get first element of document.
    pub fn root_element(&self) -> Option<Element> {
        self.container.child_elements(self).first().copied()
    }

    pub fn root_nodes(&self) -> &Vec<Node> {
        self.container.children(self)
    }

    /// Version from the XML declaration, if the input had one.
    pub fn version(&self) -> Option<&str> {
        if self.version.is_empty() {
            None
        } else {
            Some(&self.version)
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// Read
impl Document {
    pub fn parse_str(str: &str) -> Result<Document> {
        DocumentParser::parse_reader(str.as_bytes(), ReadOptions::default())
    }

    pub fn parse_str_with_opts(str: &str, opts: ReadOptions) -> Result<Document> {
        DocumentParser::parse_reader(str.as_bytes(), opts)
    }

    /// # Errors
    ///
    /// - [`Error::Read`]: The file could not be opened or read.
    /// - [`Error::CannotDecode`]: Could not decode XML.
    /// - [`Error::MalformedXML`]: Could not read XML.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
        Self::parse_file_with_opts(path, ReadOptions::default())
    }

    pub fn parse_file_with_opts<P: AsRef<Path>>(path: P, opts: ReadOptions) -> Result<Document> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        DocumentParser::parse_reader(reader, opts).map_err(|err| match err {
            Error::Io(source) => Error::Read {
                path: path.to_path_buf(),
                source,
            },
            err => err,
        })
    }

    pub fn parse_reader<R: Read>(reader: R) -> Result<Document> {
        DocumentParser::parse_reader(reader, ReadOptions::default())
    }

    pub fn parse_reader_with_opts<R: Read>(reader: R, opts: ReadOptions) -> Result<Document> {
        DocumentParser::parse_reader(reader, opts)
    }
}

// Write
impl Document {
    /// Writes document as xml string.
    pub fn write_str(&self) -> Result<String> {
        let mut buf: Vec<u8> = Vec::with_capacity(200);
        self.write(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Write document to writer. Will be written in UTF-8, with an XML declaration.
    ///
    /// Text is written as stored, so the whitespace read with the document
    /// comes back out unchanged. Top level nodes go on their own line.
    pub fn write(&self, writer: &mut impl Write) -> Result<()> {
        let mut xml_writer = Writer::new(&mut *writer);
        self.write_decl(&mut xml_writer)?;
        for node in self.root_nodes() {
            xml_writer.write_event(Event::Text(BytesText::from_escaped_str("\n")))?;
            self.write_nodes(&mut xml_writer, std::slice::from_ref(node))?;
        }
        xml_writer.write_event(Event::Eof)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    /// Serializes the whole document first, so a failure leaves no partial file behind.
    ///
    /// # Errors
    ///
    /// - [`Error::Write`]: The path is not writable.
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut buf: Vec<u8> = Vec::with_capacity(1024);
        self.write(&mut buf)?;
        std::fs::write(path, &buf).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = buf.len(), "document written");
        Ok(())
    }

    fn write_decl(&self, writer: &mut Writer<impl Write>) -> Result<()> {
        let version = self.version().unwrap_or("1.0");
        let standalone = match self.standalone {
            true => Some("yes".as_bytes()),
            false => None,
        };
        writer.write_event(Event::Decl(BytesDecl::new(
            version.as_bytes(),
            Some("UTF-8".as_bytes()),
            standalone,
        )))?;
        Ok(())
    }

    fn write_nodes(&self, writer: &mut Writer<impl Write>, nodes: &[Node]) -> Result<()> {
        for node in nodes {
            match node {
                Node::Element(eid) => self.write_element(writer, *eid)?,
                Node::Text(text) => {
                    writer.write_event(Event::Text(BytesText::from_plain_str(text)))?
                }
                // Everything but text is stored raw.
                Node::DocType(text) => {
                    writer.write_event(Event::DocType(BytesText::from_escaped_str(text)))?
                }
                Node::Comment(text) => {
                    writer.write_event(Event::Comment(BytesText::from_escaped_str(text)))?
                }
                Node::CData(text) => {
                    writer.write_event(Event::CData(BytesText::from_escaped_str(text)))?
                }
                Node::PI(text) => {
                    writer.write_event(Event::PI(BytesText::from_escaped_str(text)))?
                }
            };
        }
        Ok(())
    }

    fn write_element(&self, writer: &mut Writer<impl Write>, element: Element) -> Result<()> {
        let name_bytes = element.name(self).as_bytes();
        let mut start = BytesStart::borrowed_name(name_bytes);
        for (key, val) in element.attributes(self) {
            start.push_attribute((key.as_str(), val.as_str()));
        }
        if element.has_children(self) {
            writer.write_event(Event::Start(start))?;
            self.write_nodes(writer, element.children(self))?;
            writer.write_event(Event::End(BytesEnd::borrowed(name_bytes)))?;
        } else {
            writer.write_event(Event::Empty(start))?;
        }
        Ok(())
    }
}

impl FromStr for Document {
    type Err = Error;

    fn from_str(s: &str) -> Result<Document> {
        Document::parse_str(s)
    }
}
