//! Wire formats for Redmine payloads.
//!
//! Redmine speaks both XML and JSON. Both serializers implement
//! [`RedmineSerializer`]; the client stores a [`Format`] and dispatches through
//! it. Which entity types may cross the wire is decided by the [`Entity`]
//! bound, so a type without converters is rejected at compile time.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{PagedResult, Result};

pub mod json;
pub mod xml;

pub use json::JsonSerializer;
pub use xml::{XmlElement, XmlEntity, XmlReader, XmlSerializer, XmlWriter};

/// A Redmine resource that can be sent and received in both formats.
///
/// The JSON converter is the type's serde implementation; the XML converter is
/// its [`XmlEntity`] implementation.
pub trait Entity: Serialize + DeserializeOwned + XmlEntity + Default + Send + 'static {
    /// Root element / key of a single entity, e.g. `issue`.
    const ROOT: &'static str;

    /// Resource path and collection key, e.g. `issues`.
    const COLLECTION: &'static str;

    /// Parent resource for nested create and list calls, e.g. `projects` for
    /// `projects/<id>/issue_categories`.
    const PARENT: Option<&'static str> = None;
}

/// Turns entities into request payloads and response payloads into entities.
pub trait RedmineSerializer {
    /// Short format name, also used as the path extension (`xml`, `json`).
    fn format(&self) -> &'static str;

    /// MIME type sent as `Content-Type` and `Accept`.
    fn content_type(&self) -> &'static str;

    /// Writes `entity` under its root element/key.
    fn serialize<T: Entity>(&self, entity: &T) -> Result<String>;

    /// Reads a single entity from its root element/key.
    fn deserialize<T: Entity>(&self, payload: &str) -> Result<T>;

    /// Reads a collection envelope with `total_count`, `offset` and `limit`.
    fn deserialize_paged<T: Entity>(&self, payload: &str) -> Result<PagedResult<T>>;

    /// Reads only the total count of a collection envelope.
    ///
    /// Always agrees with `deserialize_paged(payload)?.total_count`.
    fn count<T: Entity>(&self, payload: &str) -> Result<u64>;
}

/// The wire format a client talks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// `application/xml`
    Xml,
    /// `application/json`
    #[default]
    Json,
}

impl RedmineSerializer for Format {
    fn format(&self) -> &'static str {
        match self {
            Format::Xml => XmlSerializer.format(),
            Format::Json => JsonSerializer.format(),
        }
    }

    fn content_type(&self) -> &'static str {
        match self {
            Format::Xml => XmlSerializer.content_type(),
            Format::Json => JsonSerializer.content_type(),
        }
    }

    fn serialize<T: Entity>(&self, entity: &T) -> Result<String> {
        match self {
            Format::Xml => XmlSerializer.serialize(entity),
            Format::Json => JsonSerializer.serialize(entity),
        }
    }

    fn deserialize<T: Entity>(&self, payload: &str) -> Result<T> {
        match self {
            Format::Xml => XmlSerializer.deserialize(payload),
            Format::Json => JsonSerializer.deserialize(payload),
        }
    }

    fn deserialize_paged<T: Entity>(&self, payload: &str) -> Result<PagedResult<T>> {
        match self {
            Format::Xml => XmlSerializer.deserialize_paged(payload),
            Format::Json => JsonSerializer.deserialize_paged(payload),
        }
    }

    fn count<T: Entity>(&self, payload: &str) -> Result<u64> {
        match self {
            Format::Xml => XmlSerializer.count::<T>(payload),
            Format::Json => JsonSerializer.count::<T>(payload),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.format())
    }
}
