//! # Student Form Extraction
//!
//! The add/edit forms arrive either url-encoded or as `multipart/form-data`
//! with an optional image file. Both are read into one [`StudentForm`].

use axum::{
    async_trait,
    extract::{rejection::FormRejection, FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Form,
};
use serde::Deserialize;
use tracing::warn;

use crate::domain::models::{NewImage, UploadedFile};
use shared::StudentFields;

pub(crate) const REQUIRED_FIELDS_MESSAGE: &str = "All fields are required.";

/// Form field names that carry the student's image
const IMAGE_FIELDS: [&str; 3] = ["image", "avatar", "photo"];

/// A submitted add/edit student form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentForm {
    pub fields: StudentFields,
    /// Uploaded image file, if one was chosen
    pub file: Option<UploadedFile>,
    /// External image URL given as a plain text field
    pub image_url: Option<String>,
}

impl StudentForm {
    /// Image to attach to a newly created student. An uploaded file wins
    /// over a URL.
    pub fn new_image(&self) -> Option<NewImage> {
        match (&self.file, &self.image_url) {
            (Some(file), _) => Some(NewImage::Upload(file.clone())),
            (None, Some(url)) => Some(NewImage::External(url.clone())),
            (None, None) => None,
        }
    }

    fn set_image_url(&mut self, value: &str) {
        let value = value.trim();
        if is_external_url(value) {
            self.image_url = Some(value.to_string());
        }
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, Response> {
        let mut form = StudentForm::default();

        while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
            let field_name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);

            match (field_name.as_str(), file_name) {
                (name, Some(file_name)) if IMAGE_FIELDS.contains(&name) => {
                    let content = field.bytes().await.map_err(bad_request)?;
                    // Browsers send an empty part when no file was picked
                    if !file_name.is_empty() && !content.is_empty() {
                        form.file = Some(UploadedFile {
                            original_name: file_name,
                            content: content.to_vec(),
                        });
                    }
                }
                (name, None) if IMAGE_FIELDS.contains(&name) => {
                    let value = field.text().await.map_err(bad_request)?;
                    form.set_image_url(&value);
                }
                ("name", _) => form.fields.name = field.text().await.map_err(bad_request)?,
                ("dob", _) => form.fields.dob = field.text().await.map_err(bad_request)?,
                ("contact", _) => form.fields.contact = field.text().await.map_err(bad_request)?,
                _ => {}
            }
        }

        Ok(form)
    }
}

#[derive(Debug, Deserialize)]
struct UrlEncodedStudentForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    dob: String,
    #[serde(default)]
    contact: String,
    #[serde(default, alias = "avatar", alias = "photo")]
    image: Option<String>,
}

impl From<UrlEncodedStudentForm> for StudentForm {
    fn from(raw: UrlEncodedStudentForm) -> Self {
        let mut form = StudentForm {
            fields: StudentFields::new(raw.name, raw.dob, raw.contact),
            ..Default::default()
        };
        if let Some(image) = raw.image {
            form.set_image_url(&image);
        }
        form
    }
}

#[async_trait]
impl<S> FromRequest<S> for StudentForm
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Self::from_multipart(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(raw) = Form::<UrlEncodedStudentForm>::from_request(req, state)
                .await
                .map_err(form_rejection)?;
            Ok(raw.into())
        } else {
            // No form body we understand: every field counts as missing
            warn!("Student form posted with unsupported content type '{}'", content_type);
            Ok(StudentForm::default())
        }
    }
}

fn form_rejection(rejection: FormRejection) -> Response {
    match rejection {
        FormRejection::FailedToDeserializeForm(_) | FormRejection::FailedToDeserializeFormBody(_) => {
            warn!("Malformed student form: {}", rejection.body_text());
            (StatusCode::BAD_REQUEST, REQUIRED_FIELDS_MESSAGE).into_response()
        }
        other => other.into_response(),
    }
}

fn is_external_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn bad_request(err: axum::extract::multipart::MultipartError) -> Response {
    warn!("Malformed multipart form: {}", err);
    (StatusCode::BAD_REQUEST, err.body_text()).into_response()
}
