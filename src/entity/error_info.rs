use serde::{Deserialize, Serialize};

use crate::serialization::{Entity, XmlElement, XmlEntity, XmlReader, XmlWriter};
use crate::Result;

/// One validation message from a 422 response.
///
/// JSON: `{"errors": ["Subject cannot be blank"]}`.
/// XML: `<errors type="array"><error>Subject cannot be blank</error></errors>`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorInfo {
    pub message: String,
}

impl Entity for ErrorInfo {
    const ROOT: &'static str = "error";
    const COLLECTION: &'static str = "errors";
}

impl XmlEntity for ErrorInfo {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<()> {
        writer.text(&self.message)
    }

    fn read_xml(reader: &mut XmlReader<'_>, element: &XmlElement) -> Result<Self> {
        Ok(Self {
            message: reader.read_text(element)?,
        })
    }
}
