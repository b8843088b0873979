use serde::{Deserialize, Serialize};

use super::{read_reference, reference, write_reference, IdentifiableName};
use crate::serialization::{Entity, XmlElement, XmlEntity, XmlReader, XmlWriter};
use crate::Result;

/// An issue category. Created and listed under its project
/// (`projects/<id>/issue_categories`), read and changed directly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueCategory {
    #[serde(skip_serializing)]
    pub id: Option<u64>,

    /// Set by the server from the request path.
    #[serde(skip_serializing)]
    pub project: Option<IdentifiableName>,

    pub name: String,

    #[serde(
        rename(serialize = "assigned_to_id", deserialize = "assigned_to"),
        alias = "assigned_to_id",
        with = "reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_to: Option<IdentifiableName>,
}

impl Entity for IssueCategory {
    const ROOT: &'static str = "issue_category";
    const COLLECTION: &'static str = "issue_categories";
    const PARENT: Option<&'static str> = Some("projects");
}

impl XmlEntity for IssueCategory {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<()> {
        writer.element("name", &self.name)?;
        write_reference(writer, "assigned_to_id", self.assigned_to.as_ref())
    }

    fn read_xml(reader: &mut XmlReader<'_>, element: &XmlElement) -> Result<Self> {
        let mut category = IssueCategory::default();

        while let Some(child) = reader.next_child(element)? {
            match child.name() {
                "id" => category.id = reader.read_optional(&child)?,
                "project" => category.project = Some(read_reference(reader, &child)?),
                "name" => category.name = reader.read_text(&child)?,
                "assigned_to" | "assigned_to_id" => {
                    category.assigned_to = Some(read_reference(reader, &child)?)
                }
                _ => reader.skip(&child)?,
            }
        }

        Ok(category)
    }
}
