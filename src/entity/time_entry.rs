use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{read_reference, reference, write_reference, IdentifiableName};
use crate::serialization::{Entity, XmlElement, XmlEntity, XmlReader, XmlWriter};
use crate::Result;

/// Time logged against a project or issue.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeEntry {
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
        rename(serialize = "issue_id", deserialize = "issue"),
        alias = "issue_id",
        with = "reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub issue: Option<IdentifiableName>,

    /// The user the time is logged for (admins may log for others).
    #[serde(
        rename(serialize = "user_id", deserialize = "user"),
        alias = "user_id",
        with = "reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub user: Option<IdentifiableName>,

    #[serde(
        rename(serialize = "activity_id", deserialize = "activity"),
        alias = "activity_id",
        with = "reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub activity: Option<IdentifiableName>,

    pub hours: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spent_on: Option<NaiveDate>,

    #[serde(skip_serializing)]
    pub created_on: Option<DateTime<Utc>>,

    #[serde(skip_serializing)]
    pub updated_on: Option<DateTime<Utc>>,
}

impl Entity for TimeEntry {
    const ROOT: &'static str = "time_entry";
    const COLLECTION: &'static str = "time_entries";
}

impl XmlEntity for TimeEntry {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<()> {
        write_reference(writer, "project_id", self.project.as_ref())?;
        write_reference(writer, "issue_id", self.issue.as_ref())?;
        write_reference(writer, "user_id", self.user.as_ref())?;
        write_reference(writer, "activity_id", self.activity.as_ref())?;
        writer.element_display("hours", self.hours)?;
        writer.optional("comments", self.comments.as_deref())?;
        writer.optional("spent_on", self.spent_on)
    }

    fn read_xml(reader: &mut XmlReader<'_>, element: &XmlElement) -> Result<Self> {
        let mut entry = TimeEntry::default();

        while let Some(child) = reader.next_child(element)? {
            match child.name() {
                "id" => entry.id = reader.read_optional(&child)?,
                "project" | "project_id" => entry.project = Some(read_reference(reader, &child)?),
                "issue" | "issue_id" => entry.issue = Some(read_reference(reader, &child)?),
                "user" | "user_id" => entry.user = Some(read_reference(reader, &child)?),
                "activity" | "activity_id" => entry.activity = Some(read_reference(reader, &child)?),
                "hours" => entry.hours = reader.read_optional(&child)?.unwrap_or_default(),
                "comments" => entry.comments = Some(reader.read_text(&child)?),
                "spent_on" => entry.spent_on = reader.read_optional(&child)?,
                "created_on" => entry.created_on = reader.read_optional(&child)?,
                "updated_on" => entry.updated_on = reader.read_optional(&child)?,
                _ => reader.skip(&child)?,
            }
        }

        Ok(entry)
    }
}
