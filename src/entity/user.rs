use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{read_list, write_custom_fields, IssueCustomField};
use crate::serialization::{Entity, XmlElement, XmlEntity, XmlReader, XmlWriter};
use crate::Result;

/// A Redmine user account.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(skip_serializing)]
    pub id: Option<u64>,

    pub login: String,

    pub firstname: String,

    pub lastname: String,

    pub mail: String,

    /// Only sent when creating or changing a password; never returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<IssueCustomField>,

    #[serde(skip_serializing)]
    pub created_on: Option<DateTime<Utc>>,

    #[serde(skip_serializing)]
    pub last_login_on: Option<DateTime<Utc>>,
}

impl Entity for User {
    const ROOT: &'static str = "user";
    const COLLECTION: &'static str = "users";
}

impl XmlEntity for User {
    fn write_xml(&self, writer: &mut XmlWriter) -> Result<()> {
        writer.element("login", &self.login)?;
        writer.element("firstname", &self.firstname)?;
        writer.element("lastname", &self.lastname)?;
        writer.element("mail", &self.mail)?;
        writer.optional("password", self.password.as_deref())?;
        writer.optional("admin", self.admin)?;
        write_custom_fields(writer, &self.custom_fields)
    }

    fn read_xml(reader: &mut XmlReader<'_>, element: &XmlElement) -> Result<Self> {
        let mut user = User::default();

        while let Some(child) = reader.next_child(element)? {
            match child.name() {
                "id" => user.id = reader.read_optional(&child)?,
                "login" => user.login = reader.read_text(&child)?,
                "firstname" => user.firstname = reader.read_text(&child)?,
                "lastname" => user.lastname = reader.read_text(&child)?,
                "mail" => user.mail = reader.read_text(&child)?,
                "password" => user.password = Some(reader.read_text(&child)?),
                "admin" => user.admin = reader.read_optional(&child)?,
                "custom_fields" => user.custom_fields = read_list(reader, &child, "custom_field")?,
                "created_on" => user.created_on = reader.read_optional(&child)?,
                "last_login_on" => user.last_login_on = reader.read_optional(&child)?,
                _ => reader.skip(&child)?,
            }
        }

        Ok(user)
    }
}
