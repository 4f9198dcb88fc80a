use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::browser::renderer::{ElementHandle, PageRenderer, Scope};
use crate::error::Result;
use crate::platform::catalog::Platform;
use crate::platform::classifier::{classify_platform, platform_hints};
use crate::platform::markup::{find_api_paths, find_inline_apply_link};

pub const DEFAULT_ENCODING: &str = "application/x-www-form-urlencoded";

const SUBMIT_CANDIDATES: &str = "input, button, a, [role=button]";
const SUBMIT_WORDS: [&str; 2] = ["submit", "apply"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
}

impl HttpMethod {
    /// Anything other than POST is submitted as GET, as browsers do.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("post") {
            HttpMethod::Post
        } else {
            HttpMethod::Get
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitControl {
    pub name: String,
    pub value: String,
}

/// Where and how discovered fields would be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionTarget {
    pub action_url: String,
    pub method: HttpMethod,
    pub encoding: String,
    pub submit_controls: Vec<SubmitControl>,
    pub platform: Platform,
    pub platform_hints: BTreeMap<String, String>,
    pub discovered_api_paths: BTreeSet<String>,
    /// Inline apply link found in the markup (diagnostic only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_link: Option<String>,
}

impl SubmissionTarget {
    /// Target for a page without any form element.
    pub fn formless(page_url: &str, platform: Platform) -> Self {
        SubmissionTarget {
            action_url: page_url.to_string(),
            method: HttpMethod::Get,
            encoding: DEFAULT_ENCODING.to_string(),
            submit_controls: Vec::new(),
            platform,
            platform_hints: BTreeMap::new(),
            discovered_api_paths: BTreeSet::new(),
            apply_link: None,
        }
    }

    pub fn has_submit_controls(&self) -> bool {
        !self.submit_controls.is_empty()
    }
}

/// Resolve `href` against `base`, returning `href` unchanged if either side
/// does not parse.
pub fn resolve_url(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

fn mentions_submit(text: &str) -> bool {
    let lower = text.to_lowercase();
    SUBMIT_WORDS.iter().any(|w| lower.contains(w))
}

/// Determine the submission target: every fallback included.
///
/// Never fails for lack of a form; the result may have no submit controls,
/// in which case markup-derived hints are attached.
pub fn locate_submission_target<R: PageRenderer + ?Sized>(
    renderer: &mut R,
) -> Result<SubmissionTarget> {
    let mut target = locate_form(renderer)?;
    if !target.has_submit_controls() {
        let page_url = renderer.current_url()?;
        let markup = renderer.content()?;
        apply_markup_hints(&mut target, &markup, &page_url);
    }
    Ok(target)
}

/// First `<form>` in document order, or the page itself when there is none.
/// Platform and platform hints are always filled in.
pub fn locate_form<R: PageRenderer + ?Sized>(renderer: &mut R) -> Result<SubmissionTarget> {
    let page_url = renderer.current_url()?;
    let markup = renderer.content()?;
    let platform = classify_platform(&page_url, &markup);

    let forms = renderer.query_all(Scope::Main, "form")?;
    let mut target = match forms.first() {
        Some(form) => read_form(renderer, form, &page_url, platform)?,
        None => {
            debug!(url = %page_url, "no form element; using page URL");
            SubmissionTarget::formless(&page_url, platform)
        }
    };

    target.platform_hints = platform_hints(platform, &markup);
    Ok(target)
}

fn read_form<R: PageRenderer + ?Sized>(
    renderer: &mut R,
    form: &ElementHandle,
    page_url: &str,
    platform: Platform,
) -> Result<SubmissionTarget> {
    let action_url = match renderer.attribute(form, "action")? {
        Some(action) if !action.trim().is_empty() => resolve_url(page_url, action.trim()),
        _ => page_url.to_string(),
    };
    let method = renderer
        .attribute(form, "method")?
        .map(|m| HttpMethod::parse(&m))
        .unwrap_or(HttpMethod::Get);
    let encoding = renderer
        .attribute(form, "enctype")?
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENCODING.to_string());

    Ok(SubmissionTarget {
        action_url,
        method,
        encoding,
        submit_controls: find_submit_controls(renderer, form)?,
        platform,
        platform_hints: BTreeMap::new(),
        discovered_api_paths: BTreeSet::new(),
        apply_link: None,
    })
}

/// Submit-typed buttons/inputs plus any button or link whose text mentions
/// Submit or Apply, in document order.
pub fn find_submit_controls<R: PageRenderer + ?Sized>(
    renderer: &mut R,
    form: &ElementHandle,
) -> Result<Vec<SubmitControl>> {
    let mut controls = Vec::new();

    for handle in renderer.query_within(form, SUBMIT_CANDIDATES)? {
        let tag = renderer.tag_name(&handle)?;
        let kind = renderer
            .attribute(&handle, "type")?
            .unwrap_or_default()
            .to_ascii_lowercase();
        let value_attr = renderer
            .attribute(&handle, "value")?
            .filter(|v| !v.is_empty());

        let submit_typed = (tag == "input" || tag == "button") && kind == "submit";
        let text = if tag == "input" {
            // Text inputs never act as submit controls by label.
            if !submit_typed {
                continue;
            }
            value_attr.clone().unwrap_or_default()
        } else {
            renderer.inner_text(&handle)?.trim().to_string()
        };

        if !submit_typed && !mentions_submit(&text) {
            continue;
        }

        controls.push(SubmitControl {
            name: renderer.attribute(&handle, "name")?.unwrap_or_default(),
            value: value_attr.unwrap_or(text),
        });
    }

    Ok(controls)
}

/// First link whose text mentions "Apply", resolved against the page URL.
pub fn find_apply_link<R: PageRenderer + ?Sized>(renderer: &mut R) -> Result<Option<String>> {
    let page_url = renderer.current_url()?;
    for anchor in renderer.query_all(Scope::Main, "a[href]")? {
        let text = renderer.inner_text(&anchor)?;
        if !text.to_lowercase().contains("apply") {
            continue;
        }
        let href = renderer.attribute(&anchor, "href")?.unwrap_or_default();
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }
        return Ok(Some(resolve_url(&page_url, href)));
    }
    Ok(None)
}

/// Last-resort hints from raw markup: API/apply-shaped paths and an inline
/// apply link. Diagnostic only; the target's action is left untouched.
pub fn apply_markup_hints(target: &mut SubmissionTarget, markup: &str, page_url: &str) {
    target.discovered_api_paths = find_api_paths(markup);
    target.apply_link = find_inline_apply_link(markup).map(|href| resolve_url(page_url, &href));
    debug!(
        api_paths = target.discovered_api_paths.len(),
        apply_link = target.apply_link.is_some(),
        "attached markup hints"
    );
}
