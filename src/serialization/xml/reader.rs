//! Streaming XML reader over a borrowed payload.

use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;

use super::FORMAT;
use crate::{Error, Result};

/// A start tag with its attributes decoded.
///
/// Created by [`XmlReader`]; the element's content is still unread until one
/// of the reader's `read_*`/`skip` methods is called with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    empty: bool,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>, empty: bool) -> Result<Self> {
        let name = utf8(start.name().as_ref())?.to_string();

        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| Error::deserialization(FORMAT, e))?;
            let key = utf8(attribute.key.as_ref())?.to_string();
            let value = attribute
                .unescape_value()
                .map_err(|e| Error::deserialization(FORMAT, e))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            empty,
        })
    }

    /// The element's tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the value of an attribute.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parses an attribute, returning `None` when it is absent or blank.
    pub fn parse_attribute<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.attribute(key).map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|e| Error::Deserialization {
                format: FORMAT,
                message: format!("invalid `{key}` attribute {raw:?} on <{}>: {e}", self.name),
                source: Some(Box::new(e)),
            }),
        }
    }

    /// `true` for self-closing elements such as `<project id="1"/>`.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// `true` when Redmine marked the element with `type="array"`.
    pub fn is_array(&self) -> bool {
        self.attribute("type") == Some("array")
    }
}

/// Forward-only cursor over an XML document.
///
/// Entity converters walk their children with [`next_child`](Self::next_child)
/// and must consume each child completely (read it or [`skip`](Self::skip) it)
/// before asking for the next one.
pub struct XmlReader<'a> {
    source: &'a str,
    inner: Reader<&'a [u8]>,
}

impl<'a> XmlReader<'a> {
    /// Creates a reader over `source`.
    pub fn new(source: &'a str) -> Self {
        let mut inner = Reader::from_str(source);
        inner.config_mut().trim_text(true);
        Self { source, inner }
    }

    /// Moves past the declaration, comments and doctype onto the root element.
    pub fn root(&mut self) -> Result<XmlElement> {
        loop {
            match self.next_event()? {
                Event::Start(start) => return XmlElement::from_start(&start, false),
                Event::Empty(start) => return XmlElement::from_start(&start, true),
                Event::Eof => {
                    return Err(Error::malformed(FORMAT, "document has no root element"));
                }
                _ => {}
            }
        }
    }

    /// Returns the next child start tag of `parent`, or `None` at its end tag.
    pub fn next_child(&mut self, parent: &XmlElement) -> Result<Option<XmlElement>> {
        if parent.empty {
            return Ok(None);
        }

        loop {
            match self.next_event()? {
                Event::Start(start) => return XmlElement::from_start(&start, false).map(Some),
                Event::Empty(start) => return XmlElement::from_start(&start, true).map(Some),
                Event::End(_) => return Ok(None),
                Event::Eof => return Err(unexpected_eof(parent)),
                _ => {}
            }
        }
    }

    /// Like [`next_child`](Self::next_child), but also returns the child's raw
    /// markup and leaves its content behind the cursor.
    ///
    /// The span is a complete document of its own and can be handed to a fresh
    /// reader, so one item's parsing can never consume a sibling's content.
    pub fn next_child_span(&mut self, parent: &XmlElement) -> Result<Option<(XmlElement, &'a str)>> {
        if parent.empty {
            return Ok(None);
        }

        loop {
            let begin = self.position()?;
            match self.next_event()? {
                Event::Start(start) => {
                    let element = XmlElement::from_start(&start, false)?;
                    self.inner
                        .read_to_end(QName(element.name.as_bytes()))
                        .map_err(|e| Error::deserialization(FORMAT, e))?;
                    let span = self.slice(begin)?;
                    return Ok(Some((element, span)));
                }
                Event::Empty(start) => {
                    let element = XmlElement::from_start(&start, true)?;
                    let span = self.slice(begin)?;
                    return Ok(Some((element, span)));
                }
                Event::End(_) => return Ok(None),
                Event::Eof => return Err(unexpected_eof(parent)),
                _ => {}
            }
        }
    }

    /// Reads the text content of `element` up to its end tag.
    pub fn read_text(&mut self, element: &XmlElement) -> Result<String> {
        if element.empty {
            return Ok(String::new());
        }

        let raw = self
            .inner
            .read_text(QName(element.name.as_bytes()))
            .map_err(|e| Error::deserialization(FORMAT, e))?;
        let text = quick_xml::escape::unescape(&raw).map_err(|e| Error::deserialization(FORMAT, e))?;
        Ok(text.into_owned())
    }

    /// Reads and parses the text content of `element`.
    pub fn read_parsed<T>(&mut self, element: &XmlElement) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let text = self.read_text(element)?;
        parse_text(element, text.trim())
    }

    /// Like [`read_parsed`](Self::read_parsed), mapping blank content to `None`.
    pub fn read_optional<T>(&mut self, element: &XmlElement) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let text = self.read_text(element)?;
        match text.trim() {
            "" => Ok(None),
            trimmed => parse_text(element, trimmed).map(Some),
        }
    }

    /// Consumes `element` and everything inside it.
    pub fn skip(&mut self, element: &XmlElement) -> Result<()> {
        if !element.empty {
            self.inner
                .read_to_end(QName(element.name.as_bytes()))
                .map_err(|e| Error::deserialization(FORMAT, e))?;
        }
        Ok(())
    }

    fn next_event(&mut self) -> Result<Event<'a>> {
        self.inner
            .read_event()
            .map_err(|e| Error::deserialization(FORMAT, e))
    }

    fn position(&self) -> Result<usize> {
        usize::try_from(self.inner.buffer_position())
            .map_err(|_| Error::malformed(FORMAT, "document offset out of range"))
    }

    fn slice(&self, begin: usize) -> Result<&'a str> {
        let end = self.position()?;
        let source: &'a str = self.source;
        source
            .get(begin..end)
            .ok_or_else(|| Error::malformed(FORMAT, "element span is not on a character boundary"))
    }
}

fn parse_text<T>(element: &XmlElement, text: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.parse().map_err(|e| Error::Deserialization {
        format: FORMAT,
        message: format!("invalid <{}> value {text:?}: {e}", element.name),
        source: Some(Box::new(e)),
    })
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::deserialization(FORMAT, e))
}

fn unexpected_eof(parent: &XmlElement) -> Error {
    Error::malformed(
        FORMAT,
        format!("unexpected end of document inside <{}>", parent.name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_skips_declaration() {
        let mut reader = XmlReader::new(
            r#"<?xml version="1.0" encoding="UTF-8"?><!-- hi --><issues total_count="2" type="array"></issues>"#,
        );
        let root = reader.root().unwrap();

        assert_eq!(root.name(), "issues");
        assert!(root.is_array());
        assert_eq!(root.parse_attribute::<u64>("total_count").unwrap(), Some(2));
        assert_eq!(root.parse_attribute::<u64>("offset").unwrap(), None);
    }

    #[test]
    fn test_empty_document_has_no_root() {
        let mut reader = XmlReader::new("");
        assert!(matches!(reader.root(), Err(Error::Deserialization { .. })));
    }

    #[test]
    fn test_walk_children_and_text() {
        let mut reader =
            XmlReader::new("<issue><id>7</id><subject>Fix &amp; ship</subject><extra><a/></extra></issue>");
        let root = reader.root().unwrap();

        let id = reader.next_child(&root).unwrap().unwrap();
        assert_eq!(reader.read_parsed::<u64>(&id).unwrap(), 7);

        let subject = reader.next_child(&root).unwrap().unwrap();
        assert_eq!(reader.read_text(&subject).unwrap(), "Fix & ship");

        let extra = reader.next_child(&root).unwrap().unwrap();
        reader.skip(&extra).unwrap();

        assert!(reader.next_child(&root).unwrap().is_none());
    }

    #[test]
    fn test_child_spans_are_isolated() {
        let source = "<issues><issue><id>1</id><journals><journal><notes><b>x</b></notes></journal></journals></issue><issue id=\"2\"/></issues>";
        let mut reader = XmlReader::new(source);
        let root = reader.root().unwrap();

        let (first, first_span) = reader.next_child_span(&root).unwrap().unwrap();
        assert_eq!(first.name(), "issue");
        assert!(first_span.starts_with("<issue>"));
        assert!(first_span.ends_with("</journals></issue>"));

        let (second, second_span) = reader.next_child_span(&root).unwrap().unwrap();
        assert!(second.is_empty());
        assert_eq!(second_span, "<issue id=\"2\"/>");

        assert!(reader.next_child_span(&root).unwrap().is_none());
    }

    #[test]
    fn test_invalid_number_names_the_element() {
        let mut reader = XmlReader::new("<done_ratio>lots</done_ratio>");
        let root = reader.root().unwrap();

        let err = reader.read_parsed::<u32>(&root).unwrap_err();
        assert!(err.to_string().contains("<done_ratio>"));
    }
}
