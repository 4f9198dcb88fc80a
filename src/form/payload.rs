use std::collections::BTreeMap;

use serde::Serialize;

use crate::form::field_model::{ControlKind, FieldDescriptor};

pub const PLACEHOLDER_EMAIL: &str = "me@example.com";
pub const PLACEHOLDER_PHONE: &str = "+1-555-123-4567";
pub const PLACEHOLDER_LINKEDIN: &str = "https://www.linkedin.com/in/your-handle";
pub const PLACEHOLDER_GITHUB: &str = "https://github.com/your-handle";
pub const PLACEHOLDER_URL: &str = "https://example.com";
pub const PLACEHOLDER_TEXT: &str = "Lorem ipsum";

/// A file part of a multipart submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePart {
    pub filename: String,
    pub content: Vec<u8>,
    pub content_type: String,
}

impl FilePart {
    /// Minimal PDF header standing in for a resume upload.
    pub fn placeholder_pdf() -> Self {
        FilePart {
            filename: "resume.pdf".into(),
            content: b"%PDF-1.4\n".to_vec(),
            content_type: "application/pdf".into(),
        }
    }
}

/// Structural test payload: regular fields plus file uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Payload {
    pub data: BTreeMap<String, String>,
    pub files: BTreeMap<String, FilePart>,
}

/// Type-appropriate filler for a field.
pub fn placeholder_for(field: &FieldDescriptor) -> &'static str {
    let name = field.identifier.to_lowercase();
    let kind = field.control_kind;

    if kind == ControlKind::Email || name.contains("email") {
        PLACEHOLDER_EMAIL
    } else if kind == ControlKind::Tel || name.contains("phone") {
        PLACEHOLDER_PHONE
    } else if name.contains("linkedin") {
        PLACEHOLDER_LINKEDIN
    } else if name.contains("github") {
        PLACEHOLDER_GITHUB
    } else if kind == ControlKind::Url || name.contains("url") || name.contains("website") {
        PLACEHOLDER_URL
    } else {
        PLACEHOLDER_TEXT
    }
}

/// Build a blind payload for checking a form's submission shape.
///
/// Files get a placeholder PDF, checkboxes stay unchecked (omitted), each
/// radio group gets `"on"`, everything else gets a placeholder string.
pub fn build_payload(fields: &[FieldDescriptor]) -> Payload {
    let mut payload = Payload::default();
    let mut radio_groups: Vec<&str> = Vec::new();

    for field in fields {
        let name = field.identifier.as_str();
        if name.is_empty() {
            continue;
        }

        match field.control_kind {
            ControlKind::File => {
                payload.files.insert(name.to_string(), FilePart::placeholder_pdf());
            }
            ControlKind::Checkbox => continue,
            ControlKind::Radio => {
                if !radio_groups.contains(&name) {
                    radio_groups.push(name);
                }
            }
            _ => {
                payload
                    .data
                    .insert(name.to_string(), placeholder_for(field).to_string());
            }
        }
    }

    // First member of each group stands in for a real choice.
    for name in radio_groups {
        payload.data.insert(name.to_string(), "on".to_string());
    }

    payload
}
