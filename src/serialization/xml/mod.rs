//! XML serializer.
//!
//! Conventions of the Redmine XML API:
//!
//! - single entities use their root element, e.g. `<issue>...</issue>`
//! - collections carry `total_count`, `offset` and `limit` as attributes of
//!   the root element and one child element per item
//! - lists inside an entity are marked with `type="array"`
//! - request bodies are written without an XML declaration

mod reader;
mod writer;

pub use reader::{XmlElement, XmlReader};
pub use writer::XmlWriter;

use super::{Entity, RedmineSerializer};
use crate::paged::backfill_total;
use crate::{Error, PagedResult, Result};

pub(crate) const FORMAT: &str = "xml";

/// Per-type XML converter.
///
/// `write_xml` emits the element *content*; the caller writes the enclosing
/// tag. `read_xml` receives the already-opened element and must consume it up
/// to and including its end tag.
pub trait XmlEntity: Sized {
    /// Writes the children of this entity's element.
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<()>;

    /// Reads an entity from `element`, whose start tag was just consumed.
    fn read_xml(reader: &mut XmlReader<'_>, element: &XmlElement) -> Result<Self>;
}

/// The XML implementation of [`RedmineSerializer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlSerializer;

impl RedmineSerializer for XmlSerializer {
    fn format(&self) -> &'static str {
        FORMAT
    }

    fn content_type(&self) -> &'static str {
        "application/xml"
    }

    fn serialize<T: Entity>(&self, entity: &T) -> Result<String> {
        let mut writer = XmlWriter::new();
        writer.start(T::ROOT)?;
        entity.write_xml(&mut writer)?;
        writer.end(T::ROOT)?;
        writer.into_string()
    }

    fn deserialize<T: Entity>(&self, payload: &str) -> Result<T> {
        let mut reader = XmlReader::new(payload);
        let root = reader.root()?;
        if root.name() != T::ROOT {
            return Err(Error::malformed(
                FORMAT,
                format!("expected <{}> root element, found <{}>", T::ROOT, root.name()),
            ));
        }
        T::read_xml(&mut reader, &root)
    }

    fn deserialize_paged<T: Entity>(&self, payload: &str) -> Result<PagedResult<T>> {
        let mut reader = XmlReader::new(payload);
        let root = reader.root()?;
        let total_count = root.parse_attribute::<u64>("total_count")?.unwrap_or(0);
        let offset = root.parse_attribute::<u64>("offset")?.unwrap_or(0);
        let limit = root.parse_attribute::<u64>("limit")?.unwrap_or(0);

        let mut items = Vec::new();
        while let Some((element, span)) = reader.next_child_span(&root)? {
            if element.name() == T::ROOT {
                items.push(read_item::<T>(span)?);
            }
        }

        Ok(PagedResult::new(items, total_count, offset, limit))
    }

    fn count<T: Entity>(&self, payload: &str) -> Result<u64> {
        let mut reader = XmlReader::new(payload);
        let root = reader.root()?;
        let total_count = root.parse_attribute::<u64>("total_count")?.unwrap_or(0);
        if total_count > 0 {
            return Ok(total_count);
        }

        let mut parsed = 0;
        while let Some((element, _)) = reader.next_child_span(&root)? {
            if element.name() == T::ROOT {
                parsed += 1;
            }
        }
        Ok(backfill_total(total_count, parsed))
    }
}

/// Parses one collection item from its own span with a fresh reader.
fn read_item<T: XmlEntity>(span: &str) -> Result<T> {
    let mut reader = XmlReader::new(span);
    let element = reader.root()?;
    T::read_xml(&mut reader, &element)
}
