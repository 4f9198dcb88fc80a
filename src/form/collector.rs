use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::browser::renderer::{ElementHandle, PageRenderer, Scope, SettleOutcome};
use crate::error::Result;
use crate::form::field_model::{ControlKind, FieldDescriptor};

/// Input-capable controls. Engines evaluate this against the light DOM
/// only; controls inside shadow roots are not collected.
pub const FIELD_SELECTOR: &str = "input, textarea, select";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeOutcome {
    Collected { count: usize },
    Unavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeReport {
    pub scope: Scope,
    pub outcome: ScopeOutcome,
}

/// Result of one collection pass.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    /// Main document first, then frames in enumeration order.
    pub fields: Vec<FieldDescriptor>,
    pub scopes: Vec<ScopeReport>,
    pub settle: SettleOutcome,
    /// Controls with no name, id or aria-label.
    pub dropped: usize,
}

impl CollectionReport {
    pub fn unavailable_scopes(&self) -> impl Iterator<Item = &ScopeReport> {
        self.scopes
            .iter()
            .filter(|s| matches!(s.outcome, ScopeOutcome::Unavailable { .. }))
    }
}

/// Collect every input, textarea and select across the page and its frames.
///
/// Waits for content to settle first; a timeout just means collecting what
/// is there. A frame (or element) that cannot be read is skipped. Only a
/// broken engine connection is returned as an error.
pub fn collect_fields<R: PageRenderer + ?Sized>(
    renderer: &mut R,
    settle_timeout: Duration,
) -> Result<CollectionReport> {
    let settle = match renderer.wait_for_settle(settle_timeout) {
        Ok(outcome) => outcome,
        Err(e) if e.is_transport() => return Err(e),
        Err(e) => {
            debug!(error = %e, "settle wait failed; collecting current content");
            SettleOutcome::TimedOut
        }
    };
    if settle == SettleOutcome::TimedOut {
        warn!(
            timeout_ms = settle_timeout.as_millis() as u64,
            "content did not settle; collecting partial fields"
        );
    }

    let frames = match renderer.frames() {
        Ok(frames) => frames,
        Err(e) if e.is_transport() => return Err(e),
        Err(e) => {
            warn!(error = %e, "could not enumerate frames");
            Vec::new()
        }
    };

    let mut report = CollectionReport {
        fields: Vec::new(),
        scopes: Vec::new(),
        settle,
        dropped: 0,
    };

    for scope in std::iter::once(Scope::Main).chain(frames) {
        let outcome = match collect_scope(renderer, scope) {
            Ok((fields, dropped)) => {
                let count = fields.len();
                report.fields.extend(fields);
                report.dropped += dropped;
                ScopeOutcome::Collected { count }
            }
            Err(e) if e.is_transport() => return Err(e),
            Err(e) => {
                debug!(%scope, error = %e, "skipping scope");
                ScopeOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
        };
        report.scopes.push(ScopeReport { scope, outcome });
    }

    debug!(
        fields = report.fields.len(),
        dropped = report.dropped,
        scopes = report.scopes.len(),
        "field collection finished"
    );
    Ok(report)
}

/// Collect one scope. Returns the descriptors and how many controls were
/// dropped for lack of an identifier.
fn collect_scope<R: PageRenderer + ?Sized>(
    renderer: &mut R,
    scope: Scope,
) -> Result<(Vec<FieldDescriptor>, usize)> {
    let handles = renderer.query_all(scope, FIELD_SELECTOR)?;
    let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(handles.len());
    let mut dropped = 0;

    for handle in &handles {
        match describe_element(renderer, handle) {
            Ok(Some(field)) => {
                // Radio and checkbox groups share a name; anything else keeps
                // its first occurrence within the scope.
                let duplicate = !field.control_kind.is_choice()
                    && fields.iter().any(|f| f.identifier == field.identifier);
                if !duplicate {
                    fields.push(field);
                }
            }
            Ok(None) => dropped += 1,
            Err(e) if e.is_transport() => return Err(e),
            Err(e) => debug!(%scope, error = %e, "skipping unreadable control"),
        }
    }

    Ok((fields, dropped))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Build a descriptor for one control, or `None` when it has no usable
/// identifier and could never be targeted again.
pub fn describe_element<R: PageRenderer + ?Sized>(
    renderer: &mut R,
    handle: &ElementHandle,
) -> Result<Option<FieldDescriptor>> {
    let identifier = match non_empty(renderer.attribute(handle, "name")?)
        .or(non_empty(renderer.attribute(handle, "id")?))
        .or(non_empty(renderer.attribute(handle, "aria-label")?))
    {
        Some(id) => id,
        None => return Ok(None),
    };

    let tag = renderer.tag_name(handle)?;
    let control_kind = match non_empty(renderer.attribute(handle, "type")?) {
        Some(raw) => ControlKind::from_type(&raw),
        None => match tag.as_str() {
            "select" => ControlKind::Select,
            "textarea" => ControlKind::Textarea,
            "input" => ControlKind::Text,
            _ => ControlKind::Other,
        },
    };

    let label_text = renderer.label_text(handle)?.trim().to_string();
    let placeholder_text = renderer.attribute(handle, "placeholder")?.unwrap_or_default();
    let is_required = renderer.attribute(handle, "required")?.is_some()
        || renderer
            .attribute(handle, "aria-required")?
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

    let current_value = match non_empty(renderer.attribute(handle, "value")?) {
        Some(v) => Some(v),
        None => non_empty(renderer.value(handle)?),
    };

    let is_checked = control_kind.is_choice() && renderer.checked(handle)?;
    let options = if tag == "select" {
        renderer.options(handle)?
    } else {
        Vec::new()
    };

    Ok(Some(FieldDescriptor {
        identifier,
        control_kind,
        label_text,
        placeholder_text,
        is_required,
        tag,
        current_value,
        is_checked,
        options,
    }))
}
