//! Redmine resources that the client can send and receive.
//!
//! Every type here implements [`Entity`](crate::serialization::Entity): its
//! serde derive is the JSON converter and its [`XmlEntity`] impl the XML one.
//!
//! Redmine reads references as ids (`project_id`) but returns them as named
//! objects (`"project": {"id": 1, "name": "Core"}` or
//! `<project id="1" name="Core"/>`). Both readers accept either shape.

mod error_info;
mod issue;
mod issue_category;
mod project;
mod time_entry;
mod upload;
mod user;

pub use error_info::ErrorInfo;
pub use issue::Issue;
pub use issue_category::IssueCategory;
pub use project::Project;
pub use time_entry::TimeEntry;
pub use upload::Upload;
pub use user::User;

use serde::{Deserialize, Serialize};

use crate::serialization::{XmlElement, XmlEntity, XmlReader, XmlWriter};
use crate::Result;

/// A reference to another resource: its id and, in responses, its display name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdentifiableName {
    /// The referenced resource's id.
    pub id: u64,

    /// The display name, filled in by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl IdentifiableName {
    /// A bare reference, as sent in requests.
    pub fn new(id: u64) -> Self {
        Self { id, name: None }
    }

    /// A reference with its display name.
    pub fn named(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
        }
    }
}

/// A custom field value attached to an issue, project or user.
///
/// Values are always a list in memory. On the wire a single value is a
/// scalar and anything else an array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssueCustomField {
    /// The custom field definition id.
    pub id: u64,

    /// The custom field name (responses only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Whether the field accepts several values.
    #[serde(default, skip_serializing_if = "is_false")]
    pub multiple: bool,

    /// The field's values.
    #[serde(rename = "value", default, with = "custom_values")]
    pub values: Vec<String>,
}

impl IssueCustomField {
    /// A field with a single value.
    pub fn single(id: u64, value: impl Into<String>) -> Self {
        Self {
            id,
            values: vec![value.into()],
            ..Self::default()
        }
    }

    /// A multi-value field.
    pub fn multiple<I, S>(id: u64, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            multiple: true,
            values: values.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl XmlEntity for IssueCustomField {
    /// Writes the `<value>` part; the caller writes the attributed start tag.
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<()> {
        match self.values.as_slice() {
            [] => writer.empty_array("value"),
            [single] => writer.element("value", single),
            many => {
                writer.start_array("value")?;
                for value in many {
                    writer.element("value", value)?;
                }
                writer.end("value")
            }
        }
    }

    fn read_xml(reader: &mut XmlReader<'_>, element: &XmlElement) -> Result<Self> {
        let mut field = IssueCustomField {
            id: element.parse_attribute("id")?.unwrap_or_default(),
            name: element.attribute("name").map(str::to_string),
            multiple: element.attribute("multiple") == Some("true"),
            values: Vec::new(),
        };

        while let Some(child) = reader.next_child(element)? {
            match child.name() {
                "value" if child.is_array() => {
                    while let Some(item) = reader.next_child(&child)? {
                        field.values.push(reader.read_text(&item)?);
                    }
                }
                "value" => field.values.push(reader.read_text(&child)?),
                _ => reader.skip(&child)?,
            }
        }

        Ok(field)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Writes `<custom_fields type="array">` with one attributed element per field.
pub(crate) fn write_custom_fields(writer: &mut XmlWriter, fields: &[IssueCustomField]) -> Result<()> {
    if fields.is_empty() {
        return Ok(());
    }

    writer.start_array("custom_fields")?;
    for field in fields {
        let id = field.id.to_string();
        let mut attributes = vec![("id", id.as_str())];
        if let Some(name) = &field.name {
            attributes.push(("name", name.as_str()));
        }
        if field.multiple {
            attributes.push(("multiple", "true"));
        }

        writer.start_with("custom_field", &attributes)?;
        field.write_xml(writer)?;
        writer.end("custom_field")?;
    }
    writer.end("custom_fields")
}

/// Writes `<name>id</name>` for a reference, if set.
pub(crate) fn write_reference(
    writer: &mut XmlWriter,
    name: &str,
    reference: Option<&IdentifiableName>,
) -> Result<()> {
    writer.optional(name, reference.map(|r| r.id))
}

/// Reads `<project id="1" name="Core"/>` or `<project_id>1</project_id>`.
pub(crate) fn read_reference(reader: &mut XmlReader<'_>, element: &XmlElement) -> Result<IdentifiableName> {
    match element.parse_attribute::<u64>("id")? {
        Some(id) => {
            let name = element.attribute("name").map(str::to_string);
            reader.skip(element)?;
            Ok(IdentifiableName { id, name })
        }
        None => Ok(IdentifiableName::new(reader.read_parsed(element)?)),
    }
}

/// Reads every `<item>` child of `element`, skipping anything else.
pub(crate) fn read_list<T: XmlEntity>(
    reader: &mut XmlReader<'_>,
    element: &XmlElement,
    item: &str,
) -> Result<Vec<T>> {
    let mut items = Vec::new();
    while let Some(child) = reader.next_child(element)? {
        if child.name() == item {
            items.push(T::read_xml(reader, &child)?);
        } else {
            reader.skip(&child)?;
        }
    }
    Ok(items)
}

/// Writes `<name type="array"><item>..</item>...</name>`, omitted when empty.
pub(crate) fn write_list<T: XmlEntity>(
    writer: &mut XmlWriter,
    name: &str,
    item: &str,
    items: &[T],
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }

    writer.start_array(name)?;
    for entry in items {
        writer.start(item)?;
        entry.write_xml(writer)?;
        writer.end(item)?;
    }
    writer.end(name)
}

/// JSON shape of references: an id on write, an id or an object on read.
pub(crate) mod reference {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::IdentifiableName;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Id(u64),
        Named(IdentifiableName),
    }

    pub fn serialize<S: Serializer>(
        value: &Option<IdentifiableName>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(reference) => serializer.serialize_u64(reference.id),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<IdentifiableName>, D::Error> {
        Ok(Option::<Wire>::deserialize(deserializer)?.map(|wire| match wire {
            Wire::Id(id) => IdentifiableName::new(id),
            Wire::Named(reference) => reference,
        }))
    }
}

/// JSON shape of custom field values: scalar for one value, array otherwise.
pub(crate) mod custom_values {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        One(String),
        Many(Vec<String>),
    }

    pub fn serialize<S: Serializer>(values: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        match values {
            [single] => serializer.serialize_str(single),
            many => many.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match Option::<Wire>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(Wire::One(value)) => vec![value],
            Some(Wire::Many(values)) => values,
        })
    }
}
