//! XML writer producing declaration-free request bodies.

use std::fmt::Display;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::FORMAT;
use crate::{Error, Result};

/// Thin event writer used by [`XmlEntity`](super::XmlEntity) implementations.
///
/// Text and attribute values are escaped on write.
pub struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl XmlWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self {
            inner: Writer::new(Vec::new()),
        }
    }

    /// Opens `<name>`.
    pub fn start(&mut self, name: &str) -> Result<()> {
        self.write(Event::Start(BytesStart::new(name)))
    }

    /// Opens `<name key="value" ...>`.
    pub fn start_with(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut start = BytesStart::new(name);
        for attribute in attributes {
            start.push_attribute(*attribute);
        }
        self.write(Event::Start(start))
    }

    /// Opens `<name type="array">`.
    pub fn start_array(&mut self, name: &str) -> Result<()> {
        self.start_with(name, &[("type", "array")])
    }

    /// Writes `<name type="array"/>`.
    pub fn empty_array(&mut self, name: &str) -> Result<()> {
        let mut start = BytesStart::new(name);
        start.push_attribute(("type", "array"));
        self.write(Event::Empty(start))
    }

    /// Closes `</name>`.
    pub fn end(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    /// Writes escaped character data.
    pub fn text(&mut self, value: &str) -> Result<()> {
        if value.is_empty() {
            return Ok(());
        }
        self.write(Event::Text(BytesText::new(value)))
    }

    /// Writes `<name>value</name>`.
    pub fn element(&mut self, name: &str, value: &str) -> Result<()> {
        self.start(name)?;
        self.text(value)?;
        self.end(name)
    }

    /// Writes `<name>value</name>` using the value's `Display` form.
    ///
    /// Rust's number and date formatting never depends on the locale, which
    /// is what Redmine expects for decimals.
    pub fn element_display<D: Display>(&mut self, name: &str, value: D) -> Result<()> {
        self.element(name, &value.to_string())
    }

    /// Writes the element only when a value is present.
    pub fn optional<D: Display>(&mut self, name: &str, value: Option<D>) -> Result<()> {
        match value {
            Some(value) => self.element_display(name, value),
            None => Ok(()),
        }
    }

    /// Returns the written document.
    pub fn into_string(self) -> Result<String> {
        String::from_utf8(self.inner.into_inner()).map_err(|e| Error::serialization(FORMAT, e))
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.inner
            .write_event(event)
            .map_err(|e| Error::serialization(FORMAT, e))
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}
