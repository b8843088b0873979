use serde::{Deserialize, Serialize};

use crate::serialization::{Entity, XmlElement, XmlEntity, XmlReader, XmlWriter};
use crate::Result;

/// A file uploaded to `uploads.<format>`, referenced by token when attaching
/// it to an issue.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Upload {
    #[serde(skip_serializing)]
    pub id: Option<u64>,

    pub token: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Upload {
    /// Attaches a previously uploaded file under `filename`.
    pub fn attach(token: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            filename: Some(filename.into()),
            ..Self::default()
        }
    }
}

impl Entity for Upload {
    const ROOT: &'static str = "upload";
    const COLLECTION: &'static str = "uploads";
}

impl XmlEntity for Upload {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<()> {
        writer.element("token", &self.token)?;
        writer.optional("filename", self.filename.as_deref())?;
        writer.optional("content_type", self.content_type.as_deref())?;
        writer.optional("description", self.description.as_deref())
    }

    fn read_xml(reader: &mut XmlReader<'_>, element: &XmlElement) -> Result<Self> {
        let mut upload = Upload::default();

        while let Some(child) = reader.next_child(element)? {
            match child.name() {
                "id" => upload.id = reader.read_optional(&child)?,
                "token" => upload.token = reader.read_text(&child)?,
                "filename" => upload.filename = Some(reader.read_text(&child)?),
                "content_type" => upload.content_type = Some(reader.read_text(&child)?),
                "description" => upload.description = Some(reader.read_text(&child)?),
                _ => reader.skip(&child)?,
            }
        }

        Ok(upload)
    }
}
