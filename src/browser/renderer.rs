use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AutofillError, Result};
use crate::form::field_model::SelectOption;

/// When `navigate` considers a page loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitCondition {
    Load,
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    #[default]
    #[serde(rename = "networkidle")]
    NetworkIdle,
}

impl WaitCondition {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "load" => Some(WaitCondition::Load),
            "domcontentloaded" => Some(WaitCondition::DomContentLoaded),
            "networkidle" => Some(WaitCondition::NetworkIdle),
            _ => None,
        }
    }
}

/// Document scope a query runs in: the main document or one of its frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "index")]
pub enum Scope {
    Main,
    Frame(usize),
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Main => write!(f, "main"),
            Scope::Frame(i) => write!(f, "frame[{}]", i),
        }
    }
}

/// Opaque reference to an element owned by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    pub scope: Scope,
    pub id: u64,
}

/// Read-only property lookups evaluated against a live element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementProperty {
    Checked,
    Value,
    Options,
    LabelText,
    InnerText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Flag(bool),
    Text(Option<String>),
    Options(Vec<SelectOption>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SettleOutcome {
    Settled,
    TimedOut,
}

/// The capability set the pipeline needs from a page engine.
///
/// Everything here is read-only. Mutating interactions live in
/// [`FormInteraction`].
pub trait PageRenderer {
    fn navigate(&mut self, url: &str, wait: WaitCondition, timeout: Duration) -> Result<()>;

    fn current_url(&mut self) -> Result<String>;

    /// Full markup of the main document.
    fn content(&mut self) -> Result<String>;

    /// Wait until dynamic content stops changing, bounded by `timeout`.
    fn wait_for_settle(&mut self, timeout: Duration) -> Result<SettleOutcome>;

    /// Child frames of the current page, in enumeration order.
    fn frames(&mut self) -> Result<Vec<Scope>>;

    fn query_all(&mut self, scope: Scope, selector: &str) -> Result<Vec<ElementHandle>>;

    /// Descendants of `element` matching `selector`, in document order.
    fn query_within(&mut self, element: &ElementHandle, selector: &str)
    -> Result<Vec<ElementHandle>>;

    fn attribute(&mut self, element: &ElementHandle, name: &str) -> Result<Option<String>>;

    /// Lower-cased tag name.
    fn tag_name(&mut self, element: &ElementHandle) -> Result<String>;

    fn property(&mut self, element: &ElementHandle, prop: ElementProperty)
    -> Result<PropertyValue>;

    fn checked(&mut self, element: &ElementHandle) -> Result<bool> {
        match self.property(element, ElementProperty::Checked)? {
            PropertyValue::Flag(b) => Ok(b),
            other => Err(unexpected(ElementProperty::Checked, other)),
        }
    }

    fn value(&mut self, element: &ElementHandle) -> Result<Option<String>> {
        match self.property(element, ElementProperty::Value)? {
            PropertyValue::Text(t) => Ok(t),
            other => Err(unexpected(ElementProperty::Value, other)),
        }
    }

    fn label_text(&mut self, element: &ElementHandle) -> Result<String> {
        match self.property(element, ElementProperty::LabelText)? {
            PropertyValue::Text(t) => Ok(t.unwrap_or_default()),
            other => Err(unexpected(ElementProperty::LabelText, other)),
        }
    }

    fn inner_text(&mut self, element: &ElementHandle) -> Result<String> {
        match self.property(element, ElementProperty::InnerText)? {
            PropertyValue::Text(t) => Ok(t.unwrap_or_default()),
            other => Err(unexpected(ElementProperty::InnerText, other)),
        }
    }

    fn options(&mut self, element: &ElementHandle) -> Result<Vec<SelectOption>> {
        match self.property(element, ElementProperty::Options)? {
            PropertyValue::Options(o) => Ok(o),
            // Engines report non-select elements as an empty text value.
            PropertyValue::Text(None) => Ok(Vec::new()),
            other => Err(unexpected(ElementProperty::Options, other)),
        }
    }
}

/// Mutating interactions used by the auto-fill path.
pub trait FormInteraction: PageRenderer {
    fn fill(&mut self, element: &ElementHandle, value: &str) -> Result<()>;

    fn select_option(&mut self, element: &ElementHandle, value: &str) -> Result<()>;

    fn set_checked(&mut self, element: &ElementHandle, checked: bool) -> Result<()>;

    fn set_files(&mut self, element: &ElementHandle, paths: &[PathBuf]) -> Result<()>;

    /// Click and wait for the resulting navigation. Returns the URL afterwards.
    fn click(&mut self, element: &ElementHandle, wait: WaitCondition, timeout: Duration)
    -> Result<String>;

    /// Programmatic `form.submit()`. Returns the URL afterwards.
    fn submit(&mut self, form: &ElementHandle, wait: WaitCondition, timeout: Duration)
    -> Result<String>;
}

fn unexpected(prop: ElementProperty, got: PropertyValue) -> AutofillError {
    AutofillError::SessionProtocol {
        command: "property".into(),
        error: format!("unexpected value for {:?}: {:?}", prop, got),
    }
}
