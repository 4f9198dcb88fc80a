use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AutofillError, Result};

/// Kind of input control, derived from the `type` attribute or the tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    Text,
    Email,
    Tel,
    Url,
    Password,
    Checkbox,
    Radio,
    File,
    Select,
    Textarea,
    Other,
}

/// Saved scrapes go through the same mapping as live collection, so
/// `"search"` or `"EMAIL"` load the way they were collected.
impl<'de> Deserialize<'de> for ControlKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(ControlKind::Other, ControlKind::from_type))
    }
}

impl ControlKind {
    /// Map a raw `type` attribute (or a tag name when `type` is absent).
    pub fn from_type(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "search" => ControlKind::Text,
            "email" => ControlKind::Email,
            "tel" => ControlKind::Tel,
            "url" => ControlKind::Url,
            "password" => ControlKind::Password,
            "checkbox" => ControlKind::Checkbox,
            "radio" => ControlKind::Radio,
            "file" => ControlKind::File,
            "select" | "select-one" | "select-multiple" => ControlKind::Select,
            "textarea" => ControlKind::Textarea,
            _ => ControlKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlKind::Text => "text",
            ControlKind::Email => "email",
            ControlKind::Tel => "tel",
            ControlKind::Url => "url",
            ControlKind::Password => "password",
            ControlKind::Checkbox => "checkbox",
            ControlKind::Radio => "radio",
            ControlKind::File => "file",
            ControlKind::Select => "select",
            ControlKind::Textarea => "textarea",
            ControlKind::Other => "other",
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, ControlKind::Checkbox | ControlKind::Radio)
    }
}

/// One `<option>` of a select control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub selected: bool,
}

/// One discovered input control.
///
/// Serialized as the flat interchange object
/// `{name, type, label, placeholder, required, tag, value, checked, options}`
/// so a scrape can be saved and replayed without a live browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(rename = "name")]
    pub identifier: String,
    #[serde(rename = "type")]
    pub control_kind: ControlKind,
    #[serde(rename = "label", default, deserialize_with = "null_as_default")]
    pub label_text: String,
    #[serde(rename = "placeholder", default, deserialize_with = "null_as_default")]
    pub placeholder_text: String,
    #[serde(rename = "required", default, deserialize_with = "null_as_default")]
    pub is_required: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag: String,
    #[serde(rename = "value", default)]
    pub current_value: Option<String>,
    #[serde(rename = "checked", default, deserialize_with = "null_as_default")]
    pub is_checked: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<SelectOption>,
}

impl FieldDescriptor {
    pub fn new(identifier: impl Into<String>, control_kind: ControlKind) -> Self {
        FieldDescriptor {
            identifier: identifier.into(),
            control_kind,
            label_text: String::new(),
            placeholder_text: String::new(),
            is_required: false,
            tag: match control_kind {
                ControlKind::Select => "select".into(),
                ControlKind::Textarea => "textarea".into(),
                _ => "input".into(),
            },
            current_value: None,
            is_checked: false,
            options: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label_text = label.into();
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder_text = placeholder.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.current_value = Some(value.into());
        self
    }

    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }
}

// Scrapes written by other tools use `null` for absent strings and lists.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Interchange format
// ============================================================================

pub fn fields_to_json(fields: &[FieldDescriptor]) -> Result<String> {
    serde_json::to_string_pretty(fields).map_err(|e| AutofillError::JsonSerialize {
        context: "field descriptors".into(),
        source: e,
    })
}

pub fn fields_from_json(json: &str) -> Result<Vec<FieldDescriptor>> {
    serde_json::from_str(json).map_err(|e| AutofillError::JsonParse {
        context: "field descriptors".into(),
        source: e,
    })
}

/// Load a saved scrape from disk.
pub fn load_fields(path: impl AsRef<Path>) -> Result<Vec<FieldDescriptor>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| AutofillError::io(path, e))?;
    fields_from_json(&content)
}

pub fn save_fields(path: impl AsRef<Path>, fields: &[FieldDescriptor]) -> Result<()> {
    let path = path.as_ref();
    let json = fields_to_json(fields)?;
    std::fs::write(path, json).map_err(|e| AutofillError::io(path, e))
}

/// SHA-1 over the ordered `identifier:kind` pairs of a collection. Two scans
/// of an unchanged form produce the same fingerprint.
pub fn fingerprint(fields: &[FieldDescriptor]) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    for field in fields {
        hasher.update(field.identifier.as_bytes());
        hasher.update(b":");
        hasher.update(field.control_kind.as_str().as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
