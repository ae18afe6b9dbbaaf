use crate::document::{Document, Node, ReadOptions};
use crate::element::{Attributes, Element};
use crate::error::{Error, Result};
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;
use std::io::Read;

/// Decodes raw file bytes into a UTF-8 string.
///
/// A BOM wins. Otherwise UTF-16 is recognised from `<?` and the
/// declaration's `encoding` label is honoured.
pub(crate) fn decode(bytes: &[u8]) -> Result<String> {
    let (sniffed, bom_len) = sniff_encoding(bytes);
    let body = &bytes[bom_len..];
    if bom_len > 0 {
        return decode_with(sniffed, body);
    }
    // The declaration sits at the very start, a lossy look at the head is enough.
    let head = &body[..body.len().min(DECL_PREVIEW_LEN)];
    let (preview, _) = sniffed.decode_without_bom_handling(head);
    let encoding = match declared_encoding(&preview)? {
        Some(declared) if same_family(declared, sniffed) => sniffed,
        Some(declared) if is_utf16(declared) || is_utf16(sniffed) => {
            return Err(Error::CannotDecode)
        }
        Some(declared) => declared,
        None => sniffed,
    };
    decode_with(encoding, body)
}

const DECL_PREVIEW_LEN: usize = 512;

fn sniff_encoding(bytes: &[u8]) -> (&'static Encoding, usize) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return (encoding, bom_len);
    }
    match bytes {
        [0x00, 0x3c, 0x00, 0x3f, ..] => (UTF_16BE, 0),
        [0x3c, 0x00, 0x3f, 0x00, ..] => (UTF_16LE, 0),
        _ => (UTF_8, 0),
    }
}

fn decode_with(encoding: &'static Encoding, bytes: &[u8]) -> Result<String> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(Error::CannotDecode);
    }
    Ok(text.into_owned())
}

fn is_utf16(encoding: &'static Encoding) -> bool {
    encoding == UTF_16LE || encoding == UTF_16BE
}

// Encoding::for_label("UTF-16") is UTF-16 LE, even when the bytes are BE.
fn same_family(a: &'static Encoding, b: &'static Encoding) -> bool {
    a == b || (is_utf16(a) && is_utf16(b))
}

fn declared_encoding(text: &str) -> Result<Option<&'static Encoding>> {
    let mut reader = Reader::from_str(text);
    let mut buf = Vec::with_capacity(100);
    let label = match reader.read_event(&mut buf) {
        Ok(Event::Decl(ev)) => match ev.encoding() {
            Some(label) => label?.into_owned(),
            None => return Ok(None),
        },
        // Anything else is reported by the real parse.
        _ => return Ok(None),
    };
    Encoding::for_label(&label)
        .map(Some)
        .ok_or(Error::CannotDecode)
}

pub(crate) struct DocumentParser {
    doc: Document,
    read_opts: ReadOptions,
    element_stack: Vec<Element>,
}

impl DocumentParser {
    fn new(opts: ReadOptions) -> DocumentParser {
        let doc = Document::new();
        let element_stack = vec![doc.container()];
        DocumentParser {
            doc,
            read_opts: opts,
            element_stack,
        }
    }

    pub(crate) fn parse_reader<R: Read>(mut reader: R, opts: ReadOptions) -> Result<Document> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let text = decode(&bytes)?;
        let mut parser = DocumentParser::new(opts);
        parser.parse_content(&text)?;
        tracing::debug!(
            elements = parser.doc.counter - 1,
            bytes = bytes.len(),
            "document parsed"
        );
        Ok(parser.doc)
    }

    fn handle_decl(&mut self, ev: &BytesDecl) -> Result<()> {
        self.doc.version = String::from_utf8(ev.version()?.to_vec())?;
        self.doc.standalone = match ev.standalone() {
            Some(res) => {
                let val = std::str::from_utf8(&res?)?.to_lowercase();
                if val == "yes" {
                    true
                } else if val == "no" {
                    false
                } else {
                    return Err(Error::MalformedXML(
                        "Standalone Document Declaration has non boolean value".to_string(),
                    ));
                }
            }
            None => false,
        };
        Ok(())
    }

    fn current(&self) -> Element {
        // The container is never popped, see Event::End.
        self.element_stack[self.element_stack.len() - 1]
    }

    fn at_top_level(&self) -> bool {
        self.element_stack.len() == 1
    }

    fn handle_bytes_start(&mut self, ev: &BytesStart) -> Result<Element> {
        if self.at_top_level() && self.doc.root_element().is_some() {
            return Err(Error::MalformedXML(
                "Found more than one root element".to_string(),
            ));
        }
        let full_name = String::from_utf8(ev.name().to_vec())?;
        let mut attributes = Attributes::new();
        for attr in ev.attributes() {
            let attr = attr?;
            let key = String::from_utf8(attr.key.to_vec())?;
            let value = String::from_utf8(attr.unescaped_value()?.to_vec())?;
            attributes.insert(key, value);
        }
        let element = Element::with_attributes(&mut self.doc, full_name, attributes);
        let parent = self.current();
        parent.push_child(&mut self.doc, Node::Element(element))?;
        Ok(element)
    }

    fn push_node(&mut self, node: Node) -> Result<()> {
        let parent = self.current();
        parent.push_child(&mut self.doc, node)
    }

    // Returns if document parsing is finished.
    fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Start(ref ev) => {
                let element = self.handle_bytes_start(ev)?;
                self.element_stack.push(element);
                Ok(false)
            }
            Event::End(ref ev) => {
                if self.at_top_level() {
                    return Err(Error::MalformedXML(format!(
                        "Closing tag </{}> has no opening tag",
                        String::from_utf8_lossy(ev.name())
                    )));
                }
                // quick-xml checks if tag names match for us
                if let Some(elem) = self.element_stack.pop() {
                    // distinguish <tag></tag> and <tag />
                    if self.read_opts.empty_text_node && !elem.has_children(&self.doc) {
                        elem.push_child(&mut self.doc, Node::Text(String::new()))?;
                    }
                }
                Ok(false)
            }
            Event::Empty(ref ev) => {
                self.handle_bytes_start(ev)?;
                Ok(false)
            }
            Event::Text(ev) => {
                let content = String::from_utf8(ev.unescaped()?.to_vec())?;
                let content = if self.read_opts.trim_text {
                    content.trim().to_string()
                } else {
                    content
                };
                if self.at_top_level() {
                    if content.trim().is_empty() {
                        return Ok(false);
                    }
                    return Err(Error::MalformedXML(
                        "Text found outside of the root element".to_string(),
                    ));
                }
                if content.is_empty()
                    || (self.read_opts.ignore_whitespace_only && content.trim().is_empty())
                {
                    return Ok(false);
                }
                self.push_node(Node::Text(content))?;
                Ok(false)
            }
            // Comment, CData, DocType and PI content is kept raw.
            Event::DocType(ev) => {
                let content = String::from_utf8(ev.to_vec())?;
                self.push_node(Node::DocType(content))?;
                Ok(false)
            }
            Event::Comment(ev) => {
                let content = String::from_utf8(ev.to_vec())?;
                self.push_node(Node::Comment(content))?;
                Ok(false)
            }
            Event::CData(ev) => {
                let content = String::from_utf8(ev.to_vec())?;
                self.push_node(Node::CData(content))?;
                Ok(false)
            }
            Event::PI(ev) => {
                let content = String::from_utf8(ev.to_vec())?;
                self.push_node(Node::PI(content))?;
                Ok(false)
            }
            Event::Decl(_) => Err(Error::MalformedXML(
                "XML declaration is only allowed at the start of the document".to_string(),
            )),
            Event::Eof => Ok(true),
        }
    }

    fn parse_content(&mut self, text: &str) -> Result<()> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(self.read_opts.trim_text);
        let mut buf = Vec::with_capacity(200); // reduce time increasing capacity at start.

        let first = reader.read_event(&mut buf)?;
        if let Event::Decl(ref ev) = first {
            self.handle_decl(ev)?;
        } else if self.read_opts.require_decl {
            return Err(Error::MalformedXML(
                "Didn't find XML Declaration at the start of file".to_string(),
            ));
        } else if self.handle_event(first)? {
            return self.finish();
        }
        buf.clear();

        loop {
            let ev = reader.read_event(&mut buf)?;
            tracing::trace!(event = ?ev);
            if self.handle_event(ev)? {
                return self.finish();
            }
            buf.clear();
        }
    }

    fn finish(&self) -> Result<()> {
        if !self.at_top_level() {
            return Err(Error::MalformedXML(format!(
                "Element <{}> is never closed",
                self.current().name(&self.doc)
            )));
        }
        if self.doc.root_element().is_none() {
            return Err(Error::MalformedXML("No root element found".to_string()));
        }
        Ok(())
    }
}
