use serde::{Deserialize, Serialize};

/// A student record as persisted in the JSON document.
///
/// `avatar` holds either a reference into the upload directory
/// (`uploads/<file name>`) or an external URL. Older documents used `photo`
/// or `image` for the same field, so both are accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "studentId")]
    pub student_id: u32,
    pub name: String,
    /// Date of birth (YYYY-MM-DD)
    pub dob: String,
    pub contact: String,
    #[serde(default, alias = "photo", alias = "image")]
    pub avatar: Option<String>,
}

/// Text fields submitted by the add/edit student forms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentFields {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub contact: String,
}

impl StudentFields {
    pub fn new(name: impl Into<String>, dob: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dob: dob.into(),
            contact: contact.into(),
        }
    }
}

/// Query string accepted by the student list page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSearchQuery {
    pub search: Option<String>,
}
