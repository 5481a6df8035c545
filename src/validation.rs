//! Field rules for submitted school records.
//!
//! Every rule is checked independently and all violations are returned
//! together, in field order, so a form can show every problem at once.

use std::sync::LazyLock;

use bytes::Bytes;
use regex::Regex;
use schooldir_common::paths::file_extension;
use schooldir_common::ImageFormat;
use schooldir_db::models::NewSchool;

/// Largest accepted image payload.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is a valid regex")
});

/// An uploaded image as received from the form.
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    /// File name declared by the client.
    pub file_name: String,
    /// Content type declared by the client.
    pub content_type: String,
    pub data: Bytes,
}

impl ImageUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_content_type(&self.content_type)
    }

    /// Extension (with leading dot) to store the image under.
    ///
    /// The client's file extension is kept when it is one of the accepted
    /// image extensions; otherwise it is derived from the content type.
    pub fn extension(&self) -> String {
        file_extension(&self.file_name)
            .filter(|ext| matches!(ext.as_str(), ".jpg" | ".jpeg" | ".png"))
            .or_else(|| self.format().map(|f| f.extension().to_string()))
            .unwrap_or_default()
    }
}

/// A school record as submitted, before any checks.
#[derive(Debug, Clone, Default)]
pub struct Candidate {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub contact: String,
    pub email: String,
    pub image: Option<ImageUpload>,
}

/// A candidate that passed every rule, with trimmed field values.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub contact: String,
    pub email: String,
    pub image: ImageUpload,
}

impl NewRecord {
    /// Row values for this record once its image is stored under `reference`.
    pub fn into_new_school(self, reference: String) -> NewSchool {
        NewSchool {
            name: self.name,
            address: self.address,
            city: self.city,
            state: self.state,
            contact: self.contact,
            image: reference,
            email: self.email,
        }
    }
}

// Pattern rules require at least one character, so an empty field fails
// both its required rule and its pattern rule.
fn is_name(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ')
}

fn is_city(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic() || c == ' ')
}

fn is_contact(value: &str) -> bool {
    value.len() == 10 && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Check a candidate against every field rule.
///
/// Returns the normalized record, or one message per failed rule.
pub fn validate(candidate: Candidate) -> Result<NewRecord, Vec<String>> {
    let mut errors = Vec::new();

    let name = candidate.name.trim().to_string();
    let address = candidate.address.trim().to_string();
    let city = candidate.city.trim().to_string();
    let state = candidate.state.trim().to_string();
    let contact = candidate.contact.trim().to_string();
    let email = candidate.email.trim().to_string();

    if name.is_empty() {
        errors.push("Name is required".to_string());
    }
    if !is_name(&name) {
        errors.push("Name must be alphanumeric".to_string());
    }

    if address.is_empty() {
        errors.push("Address is required".to_string());
    }

    if city.is_empty() {
        errors.push("City is required".to_string());
    }
    if !is_city(&city) {
        errors.push("City must contain only alphabets".to_string());
    }

    if state.is_empty() {
        errors.push("State is required".to_string());
    }

    if contact.is_empty() {
        errors.push("Contact is required".to_string());
    }
    if !is_contact(&contact) {
        errors.push("Contact must be a 10-digit number".to_string());
    }

    if email.is_empty() {
        errors.push("Email is required".to_string());
    } else if !is_email(&email) {
        errors.push("Invalid email format".to_string());
    }

    let image = candidate.image.filter(|image| image.size() > 0);
    match &image {
        None => errors.push("Image is required".to_string()),
        Some(image) => {
            if image.size() > MAX_IMAGE_BYTES {
                errors.push("File size too large (max 2MB)".to_string());
            }
            if image.format().is_none() {
                errors.push("Unsupported file format".to_string());
            }
        }
    }

    match image {
        Some(image) if errors.is_empty() => Ok(NewRecord {
            name,
            address,
            city,
            state,
            contact,
            email,
            image,
        }),
        _ => Err(errors),
    }
}
