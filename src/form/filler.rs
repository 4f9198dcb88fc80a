use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::browser::renderer::{ElementHandle, FormInteraction, Scope, WaitCondition};
use crate::error::Result;
use crate::form::field_model::ControlKind;
use crate::form::value_mapper::CandidateValueAssignment;

/// Visible controls that can be targeted by name, id or aria-label.
const FILLABLE_SELECTOR: &str = "input:not([type=hidden]), textarea, select";
const SUBMIT_TYPED_SELECTOR: &str = "input[type=submit], button[type=submit]";
const LABELLED_ACTION_SELECTOR: &str = "button, a, [role=button]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillValue {
    Text(String),
    Flag(bool),
    Files(Vec<PathBuf>),
}

impl From<String> for FillValue {
    fn from(value: String) -> Self {
        FillValue::Text(value)
    }
}

impl From<&str> for FillValue {
    fn from(value: &str) -> Self {
        FillValue::Text(value.to_string())
    }
}

impl From<bool> for FillValue {
    fn from(value: bool) -> Self {
        FillValue::Flag(value)
    }
}

impl From<&CandidateValueAssignment> for BTreeMap<String, FillValue> {
    fn from(assignment: &CandidateValueAssignment) -> Self {
        assignment
            .iter()
            .map(|(k, v)| (k.to_string(), FillValue::from(v)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillFailure {
    pub identifier: String,
    pub reason: String,
}

/// What happened to each requested value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    pub filled: Vec<String>,
    /// No visible control carries this identifier.
    pub missing: Vec<String>,
    /// The value does not suit the control (e.g. text for a checkbox).
    pub skipped: Vec<String>,
    pub failed: Vec<FillFailure>,
}

struct Target {
    handle: ElementHandle,
    tag: String,
    kind: ControlKind,
    keys: [Option<String>; 3],
}

fn index_targets<R: FormInteraction + ?Sized>(renderer: &mut R) -> Result<Vec<Target>> {
    let mut targets = Vec::new();
    for handle in renderer.query_all(Scope::Main, FILLABLE_SELECTOR)? {
        let tag = renderer.tag_name(&handle)?;
        let kind = match renderer.attribute(&handle, "type")? {
            Some(t) if !t.is_empty() => ControlKind::from_type(&t),
            _ => ControlKind::from_type(&tag),
        };
        let keys = [
            renderer.attribute(&handle, "name")?,
            renderer.attribute(&handle, "id")?,
            renderer.attribute(&handle, "aria-label")?,
        ];
        targets.push(Target {
            handle,
            tag,
            kind,
            keys,
        });
    }
    Ok(targets)
}

/// Fill the main document's controls.
///
/// Each key targets the first visible control whose name, id or aria-label
/// equals it. Per-field problems are recorded in the report; only a broken
/// engine connection is returned as an error.
pub fn fill_fields<R: FormInteraction + ?Sized>(
    renderer: &mut R,
    values: &BTreeMap<String, FillValue>,
) -> Result<FillReport> {
    let targets = index_targets(renderer)?;
    let mut report = FillReport::default();

    for (key, value) in values {
        let Some(target) = targets
            .iter()
            .find(|t| t.keys.iter().flatten().any(|k| k == key))
        else {
            debug!(%key, "no control for value");
            report.missing.push(key.clone());
            continue;
        };

        let handle = &target.handle;
        let attempt = match (target.kind, value) {
            (ControlKind::File, FillValue::Files(paths)) if !paths.is_empty() => {
                Some(renderer.set_files(handle, paths))
            }
            (ControlKind::File, FillValue::Text(path)) if !path.is_empty() => {
                Some(renderer.set_files(handle, &[PathBuf::from(path)]))
            }
            (ControlKind::Checkbox | ControlKind::Radio, FillValue::Flag(checked)) => {
                Some(renderer.set_checked(handle, *checked))
            }
            (_, FillValue::Text(text)) if target.tag == "select" => {
                Some(renderer.select_option(handle, text))
            }
            (kind, FillValue::Text(text)) if kind != ControlKind::File && !kind.is_choice() => {
                Some(renderer.fill(handle, text))
            }
            _ => None,
        };

        match attempt {
            Some(Ok(())) => report.filled.push(key.clone()),
            Some(Err(e)) if e.is_transport() => return Err(e),
            Some(Err(e)) => {
                warn!(%key, error = %e, "could not fill field");
                report.failed.push(FillFailure {
                    identifier: key.clone(),
                    reason: e.to_string(),
                });
            }
            None => report.skipped.push(key.clone()),
        }
    }

    info!(
        filled = report.filled.len(),
        missing = report.missing.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "fill finished"
    );
    Ok(report)
}

/// Fill the values chosen by the value mapper.
pub fn fill_assignment<R: FormInteraction + ?Sized>(
    renderer: &mut R,
    assignment: &CandidateValueAssignment,
) -> Result<FillReport> {
    fill_fields(renderer, &BTreeMap::from(assignment))
}

/// Result of a best-effort submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SubmitOutcome {
    Submitted { final_url: String },
    /// Nothing to click and no form to submit; the page was left as is.
    NoSubmitMechanism { page_url: String },
    Failed { reason: String },
}

impl SubmitOutcome {
    /// The URL after the attempt, or an empty string when it failed.
    pub fn final_url_or_empty(&self) -> String {
        match self {
            SubmitOutcome::Submitted { final_url } => final_url.clone(),
            SubmitOutcome::NoSubmitMechanism { page_url } => page_url.clone(),
            SubmitOutcome::Failed { .. } => String::new(),
        }
    }
}

/// Try, in order: the first submit-typed control, the first button or link
/// mentioning Submit/Apply, a programmatic submit of the first form.
/// Never returns an error; failures become [`SubmitOutcome::Failed`].
pub fn submit_form<R: FormInteraction + ?Sized>(
    renderer: &mut R,
    wait: WaitCondition,
    timeout: Duration,
) -> SubmitOutcome {
    match try_submit(renderer, wait, timeout) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "submit attempt failed");
            SubmitOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

fn try_submit<R: FormInteraction + ?Sized>(
    renderer: &mut R,
    wait: WaitCondition,
    timeout: Duration,
) -> Result<SubmitOutcome> {
    if let Some(control) = renderer
        .query_all(Scope::Main, SUBMIT_TYPED_SELECTOR)?
        .into_iter()
        .next()
    {
        let final_url = renderer.click(&control, wait, timeout)?;
        return Ok(SubmitOutcome::Submitted { final_url });
    }

    for candidate in renderer.query_all(Scope::Main, LABELLED_ACTION_SELECTOR)? {
        let text = renderer.inner_text(&candidate)?.to_lowercase();
        if text.contains("submit") || text.contains("apply") {
            let final_url = renderer.click(&candidate, wait, timeout)?;
            return Ok(SubmitOutcome::Submitted { final_url });
        }
    }

    if let Some(form) = renderer.query_all(Scope::Main, "form")?.into_iter().next() {
        let final_url = renderer.submit(&form, wait, timeout)?;
        return Ok(SubmitOutcome::Submitted { final_url });
    }

    Ok(SubmitOutcome::NoSubmitMechanism {
        page_url: renderer.current_url()?,
    })
}
