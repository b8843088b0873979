use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{
    read_list, read_reference, reference, write_custom_fields, write_list, write_reference,
    IdentifiableName, IssueCustomField, Upload,
};
use crate::serialization::{Entity, XmlElement, XmlEntity, XmlReader, XmlWriter};
use crate::Result;

/// A Redmine issue.
///
/// `id`, `author`, `created_on` and `updated_on` are assigned by the server
/// and never written to request bodies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Issue {
    #[serde(skip_serializing)]
    pub id: Option<u64>,

    #[serde(
        rename(serialize = "project_id", deserialize = "project"),
        alias = "project_id",
        with = "reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub project: Option<IdentifiableName>,

    #[serde(
        rename(serialize = "tracker_id", deserialize = "tracker"),
        alias = "tracker_id",
        with = "reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub tracker: Option<IdentifiableName>,

    #[serde(
        rename(serialize = "status_id", deserialize = "status"),
        alias = "status_id",
        with = "reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<IdentifiableName>,

    #[serde(
        rename(serialize = "priority_id", deserialize = "priority"),
        alias = "priority_id",
        with = "reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<IdentifiableName>,

    #[serde(
        rename(serialize = "assigned_to_id", deserialize = "assigned_to"),
        alias = "assigned_to_id",
        with = "reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_to: Option<IdentifiableName>,

    #[serde(
        rename(serialize = "category_id", deserialize = "category"),
        alias = "category_id",
        with = "reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<IdentifiableName>,

    /// The parent issue.
    #[serde(
        rename(serialize = "parent_issue_id", deserialize = "parent"),
        alias = "parent_issue_id",
        with = "reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent: Option<IdentifiableName>,

    #[serde(skip_serializing)]
    pub author: Option<IdentifiableName>,

    pub subject: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub done_ratio: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,

    /// A journal note added together with an update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<IssueCustomField>,

    /// Files attached through upload tokens.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uploads: Vec<Upload>,

    #[serde(skip_serializing)]
    pub created_on: Option<DateTime<Utc>>,

    #[serde(skip_serializing)]
    pub updated_on: Option<DateTime<Utc>>,
}

impl Entity for Issue {
    const ROOT: &'static str = "issue";
    const COLLECTION: &'static str = "issues";
}

impl XmlEntity for Issue {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<()> {
        write_reference(writer, "project_id", self.project.as_ref())?;
        write_reference(writer, "tracker_id", self.tracker.as_ref())?;
        write_reference(writer, "status_id", self.status.as_ref())?;
        write_reference(writer, "priority_id", self.priority.as_ref())?;
        write_reference(writer, "assigned_to_id", self.assigned_to.as_ref())?;
        write_reference(writer, "category_id", self.category.as_ref())?;
        write_reference(writer, "parent_issue_id", self.parent.as_ref())?;
        writer.element("subject", &self.subject)?;
        writer.optional("description", self.description.as_deref())?;
        writer.optional("start_date", self.start_date)?;
        writer.optional("due_date", self.due_date)?;
        writer.optional("done_ratio", self.done_ratio)?;
        writer.optional("estimated_hours", self.estimated_hours)?;
        writer.optional("is_private", self.is_private)?;
        writer.optional("notes", self.notes.as_deref())?;
        write_custom_fields(writer, &self.custom_fields)?;
        write_list(writer, "uploads", "upload", &self.uploads)
    }

    fn read_xml(reader: &mut XmlReader<'_>, element: &XmlElement) -> Result<Self> {
        let mut issue = Issue::default();

        while let Some(child) = reader.next_child(element)? {
            match child.name() {
                "id" => issue.id = reader.read_optional(&child)?,
                "project" | "project_id" => issue.project = Some(read_reference(reader, &child)?),
                "tracker" | "tracker_id" => issue.tracker = Some(read_reference(reader, &child)?),
                "status" | "status_id" => issue.status = Some(read_reference(reader, &child)?),
                "priority" | "priority_id" => issue.priority = Some(read_reference(reader, &child)?),
                "assigned_to" | "assigned_to_id" => {
                    issue.assigned_to = Some(read_reference(reader, &child)?)
                }
                "category" | "category_id" => issue.category = Some(read_reference(reader, &child)?),
                "parent" | "parent_issue_id" => issue.parent = Some(read_reference(reader, &child)?),
                "author" => issue.author = Some(read_reference(reader, &child)?),
                "subject" => issue.subject = reader.read_text(&child)?,
                "description" => issue.description = Some(reader.read_text(&child)?),
                "start_date" => issue.start_date = reader.read_optional(&child)?,
                "due_date" => issue.due_date = reader.read_optional(&child)?,
                "done_ratio" => issue.done_ratio = reader.read_optional(&child)?,
                "estimated_hours" => issue.estimated_hours = reader.read_optional(&child)?,
                "is_private" => issue.is_private = reader.read_optional(&child)?,
                "notes" => issue.notes = Some(reader.read_text(&child)?),
                "custom_fields" => issue.custom_fields = read_list(reader, &child, "custom_field")?,
                "uploads" => issue.uploads = read_list(reader, &child, "upload")?,
                "created_on" => issue.created_on = reader.read_optional(&child)?,
                "updated_on" => issue.updated_on = reader.read_optional(&child)?,
                _ => reader.skip(&child)?,
            }
        }

        Ok(issue)
    }
}
