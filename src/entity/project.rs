use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    read_list, read_reference, reference, write_custom_fields, write_reference, IdentifiableName,
    IssueCustomField,
};
use crate::serialization::{Entity, XmlElement, XmlEntity, XmlReader, XmlWriter};
use crate::Result;

/// A Redmine project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    #[serde(skip_serializing)]
    pub id: Option<u64>,

    pub name: String,

    /// The unique URL slug, e.g. `redmine`.
    pub identifier: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,

    #[serde(
        rename(serialize = "parent_id", deserialize = "parent"),
        alias = "parent_id",
        with = "reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<IdentifiableName>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherit_members: Option<bool>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<IssueCustomField>,

    /// 1 active, 5 closed, 9 archived.
    #[serde(skip_serializing)]
    pub status: Option<u32>,

    #[serde(skip_serializing)]
    pub created_on: Option<DateTime<Utc>>,

    #[serde(skip_serializing)]
    pub updated_on: Option<DateTime<Utc>>,
}

impl Entity for Project {
    const ROOT: &'static str = "project";
    const COLLECTION: &'static str = "projects";
}

impl XmlEntity for Project {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<()> {
        writer.element("name", &self.name)?;
        writer.element("identifier", &self.identifier)?;
        writer.optional("description", self.description.as_deref())?;
        writer.optional("homepage", self.homepage.as_deref())?;
        writer.optional("is_public", self.is_public)?;
        write_reference(writer, "parent_id", self.parent.as_ref())?;
        writer.optional("inherit_members", self.inherit_members)?;
        write_custom_fields(writer, &self.custom_fields)
    }

    fn read_xml(reader: &mut XmlReader<'_>, element: &XmlElement) -> Result<Self> {
        let mut project = Project::default();

        while let Some(child) = reader.next_child(element)? {
            match child.name() {
                "id" => project.id = reader.read_optional(&child)?,
                "name" => project.name = reader.read_text(&child)?,
                "identifier" => project.identifier = reader.read_text(&child)?,
                "description" => project.description = Some(reader.read_text(&child)?),
                "homepage" => project.homepage = Some(reader.read_text(&child)?),
                "is_public" => project.is_public = reader.read_optional(&child)?,
                "parent" | "parent_id" => project.parent = Some(read_reference(reader, &child)?),
                "inherit_members" => project.inherit_members = reader.read_optional(&child)?,
                "custom_fields" => {
                    project.custom_fields = read_list(reader, &child, "custom_field")?
                }
                "status" => project.status = reader.read_optional(&child)?,
                "created_on" => project.created_on = reader.read_optional(&child)?,
                "updated_on" => project.updated_on = reader.read_optional(&child)?,
                _ => reader.skip(&child)?,
            }
        }

        Ok(project)
    }
}
