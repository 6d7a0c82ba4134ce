use shared::StudentFields;

pub type StudentId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub date_of_birth: String,
    pub contact: String,
    /// Upload reference (`uploads/<file>`) or external URL
    pub image_ref: Option<String>,
}

impl Student {
    pub fn apply(&mut self, details: StudentDetails) {
        self.name = details.name;
        self.date_of_birth = details.date_of_birth;
        self.contact = details.contact;
    }
}

/// Required student fields after trimming and presence checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDetails {
    pub name: String,
    pub date_of_birth: String,
    pub contact: String,
}

impl StudentDetails {
    /// Validate submitted form fields. Fields are trimmed; a field holding
    /// only whitespace counts as missing. Date of birth is taken as text and
    /// not checked against the calendar.
    pub fn validate(fields: &StudentFields) -> Result<Self, StudentValidationError> {
        let name = fields.name.trim();
        if name.is_empty() {
            return Err(StudentValidationError::MissingName);
        }

        let date_of_birth = fields.dob.trim();
        if date_of_birth.is_empty() {
            return Err(StudentValidationError::MissingDateOfBirth);
        }

        let contact = fields.contact.trim();
        if contact.is_empty() {
            return Err(StudentValidationError::MissingContact);
        }

        Ok(Self {
            name: name.to_string(),
            date_of_birth: date_of_birth.to_string(),
            contact: contact.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StudentValidationError {
    #[error("Name is required")]
    MissingName,
    #[error("Date of birth is required")]
    MissingDateOfBirth,
    #[error("Contact is required")]
    MissingContact,
}

/// Image content received with an add/edit submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub original_name: String,
    pub content: Vec<u8>,
}

/// Image supplied when a student is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewImage {
    Upload(UploadedFile),
    External(String),
}
