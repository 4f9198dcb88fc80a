use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::browser::renderer::{
    ElementHandle, ElementProperty, FormInteraction, PageRenderer, PropertyValue, Scope,
    SettleOutcome, WaitCondition,
};
use crate::error::{AutofillError, Result};
use crate::form::field_model::SelectOption;

/// A recorded mutation against a static page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    Filled { target: String, value: String },
    Selected { target: String, value: String },
    Checked { target: String, checked: bool },
    Files { target: String, paths: Vec<PathBuf> },
    Clicked { target: String },
    Submitted { target: String },
}

struct Document {
    html: Html,
    /// Set when the frame's content cannot be read (external `src`).
    unavailable: Option<String>,
}

/// Offline renderer over saved markup.
///
/// Frames declared with `srcdoc` become readable scopes; frames with an
/// external `src` behave like cross-origin frames and refuse queries.
/// There is no script execution, so the page is always settled.
pub struct StaticPage {
    pages: HashMap<String, String>,
    url: String,
    source: String,
    documents: Vec<Document>,
    handles: Vec<(usize, NodeId)>,
    interactions: Vec<Interaction>,
}

impl StaticPage {
    /// A single page loaded at `url`.
    pub fn new(url: &str, html: &str) -> Self {
        Self::with_pages(url, [(url, html)])
    }

    /// Register several pages so `navigate` can move between them; `start` is
    /// loaded immediately (an empty document if it was not registered).
    pub fn with_pages<'a>(start: &str, pages: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let pages: HashMap<String, String> = pages
            .into_iter()
            .map(|(u, h)| (u.to_string(), h.to_string()))
            .collect();
        let html = pages.get(start).cloned().unwrap_or_default();
        let mut page = StaticPage {
            pages,
            url: String::new(),
            source: String::new(),
            documents: Vec::new(),
            handles: Vec::new(),
            interactions: Vec::new(),
        };
        page.load(start, html);
        page
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    fn load(&mut self, url: &str, source: String) {
        let main = Html::parse_document(&source);
        let mut documents = vec![];

        let iframe = Selector::parse("iframe").expect("static selector");
        let frames: Vec<Document> = main
            .select(&iframe)
            .map(|frame| match frame.value().attr("srcdoc") {
                Some(srcdoc) => Document {
                    html: Html::parse_document(srcdoc),
                    unavailable: None,
                },
                None => Document {
                    html: Html::new_document(),
                    unavailable: Some(format!(
                        "cross-origin frame {}",
                        frame.value().attr("src").unwrap_or("about:blank")
                    )),
                },
            })
            .collect();

        documents.push(Document {
            html: main,
            unavailable: None,
        });
        documents.extend(frames);

        self.url = url.to_string();
        self.source = source;
        self.documents = documents;
        self.handles.clear();
    }

    fn document(&self, scope: Scope) -> Result<(usize, &Document)> {
        let index = match scope {
            Scope::Main => 0,
            Scope::Frame(i) => i + 1,
        };
        let doc = self
            .documents
            .get(index)
            .ok_or_else(|| AutofillError::ScopeUnavailable {
                scope: scope.to_string(),
                reason: "no such frame".into(),
            })?;
        if let Some(reason) = &doc.unavailable {
            return Err(AutofillError::ScopeUnavailable {
                scope: scope.to_string(),
                reason: reason.clone(),
            });
        }
        Ok((index, doc))
    }

    fn element(&self, handle: &ElementHandle) -> Result<ElementRef<'_>> {
        let (doc_index, node) = *self
            .handles
            .get(handle.id as usize)
            .ok_or(AutofillError::StaleHandle(handle.id))?;
        self.documents
            .get(doc_index)
            .and_then(|doc| doc.html.tree.get(node))
            .and_then(ElementRef::wrap)
            .ok_or(AutofillError::StaleHandle(handle.id))
    }

    fn register(&mut self, scope: Scope, doc_index: usize, nodes: Vec<NodeId>) -> Vec<ElementHandle> {
        nodes
            .into_iter()
            .map(|node| {
                self.handles.push((doc_index, node));
                ElementHandle {
                    scope,
                    id: (self.handles.len() - 1) as u64,
                }
            })
            .collect()
    }

    fn target_name(&self, handle: &ElementHandle) -> String {
        self.element(handle)
            .map(|el| {
                let v = el.value();
                v.attr("name")
                    .or_else(|| v.attr("id"))
                    .or_else(|| v.attr("aria-label"))
                    .unwrap_or_else(|| v.name())
                    .to_string()
            })
            .unwrap_or_default()
    }

    fn record(&mut self, interaction: Interaction) {
        debug!(?interaction, "static page interaction");
        self.interactions.push(interaction);
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| AutofillError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

fn collapse_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn select_options(el: ElementRef<'_>) -> Vec<SelectOption> {
    let option = Selector::parse("option").expect("static selector");
    let mut options: Vec<SelectOption> = el
        .select(&option)
        .map(|o| {
            let text = collapse_text(o);
            SelectOption {
                value: o.value().attr("value").map(str::to_string).unwrap_or_else(|| text.clone()),
                label: o.value().attr("label").map(str::to_string).unwrap_or(text),
                selected: o.value().attr("selected").is_some(),
            }
        })
        .collect();

    // Single selects show their first option when nothing is marked.
    let multiple = el.value().attr("multiple").is_some();
    if !multiple && !options.iter().any(|o| o.selected) {
        if let Some(first) = options.first_mut() {
            first.selected = true;
        }
    }
    options
}

fn label_for(doc: &Html, el: ElementRef<'_>) -> String {
    if let Some(id) = el.value().attr("id") {
        let labels = Selector::parse("label").expect("static selector");
        if let Some(label) = doc
            .select(&labels)
            .find(|l| l.value().attr("for") == Some(id))
        {
            return collapse_text(label);
        }
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "label")
        .map(collapse_text)
        .unwrap_or_default()
}

impl PageRenderer for StaticPage {
    fn navigate(&mut self, url: &str, _wait: WaitCondition, _timeout: Duration) -> Result<()> {
        if let Some(html) = self.pages.get(url).cloned() {
            self.load(url, html);
            return Ok(());
        }
        if let Some(path) = url.strip_prefix("file://") {
            let html = std::fs::read_to_string(path).map_err(|e| AutofillError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            self.load(url, html);
            return Ok(());
        }
        Err(AutofillError::Navigation {
            url: url.to_string(),
            reason: "page not registered with static renderer".into(),
        })
    }

    fn current_url(&mut self) -> Result<String> {
        Ok(self.url.clone())
    }

    fn content(&mut self) -> Result<String> {
        Ok(self.source.clone())
    }

    fn wait_for_settle(&mut self, _timeout: Duration) -> Result<SettleOutcome> {
        Ok(SettleOutcome::Settled)
    }

    fn frames(&mut self) -> Result<Vec<Scope>> {
        Ok((0..self.documents.len().saturating_sub(1))
            .map(Scope::Frame)
            .collect())
    }

    fn query_all(&mut self, scope: Scope, selector: &str) -> Result<Vec<ElementHandle>> {
        let sel = parse_selector(selector)?;
        let (doc_index, doc) = self.document(scope)?;
        let nodes: Vec<NodeId> = doc.html.select(&sel).map(|el| el.id()).collect();
        Ok(self.register(scope, doc_index, nodes))
    }

    fn query_within(
        &mut self,
        element: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>> {
        let sel = parse_selector(selector)?;
        let (doc_index, _) = *self
            .handles
            .get(element.id as usize)
            .ok_or(AutofillError::StaleHandle(element.id))?;
        let nodes: Vec<NodeId> = self.element(element)?.select(&sel).map(|el| el.id()).collect();
        Ok(self.register(element.scope, doc_index, nodes))
    }

    fn attribute(&mut self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        Ok(self.element(element)?.value().attr(name).map(str::to_string))
    }

    fn tag_name(&mut self, element: &ElementHandle) -> Result<String> {
        Ok(self.element(element)?.value().name().to_ascii_lowercase())
    }

    fn property(
        &mut self,
        element: &ElementHandle,
        prop: ElementProperty,
    ) -> Result<PropertyValue> {
        let el = self.element(element)?;
        let tag = el.value().name();
        Ok(match prop {
            ElementProperty::Checked => PropertyValue::Flag(el.value().attr("checked").is_some()),
            ElementProperty::Value => PropertyValue::Text(match tag {
                "textarea" => Some(el.text().collect::<String>()),
                "select" => select_options(el)
                    .into_iter()
                    .find(|o| o.selected)
                    .map(|o| o.value),
                _ => el.value().attr("value").map(str::to_string),
            }),
            ElementProperty::Options if tag == "select" => {
                PropertyValue::Options(select_options(el))
            }
            ElementProperty::Options => PropertyValue::Text(None),
            ElementProperty::LabelText => {
                let (_, doc) = self.document(element.scope)?;
                PropertyValue::Text(Some(label_for(&doc.html, el)))
            }
            ElementProperty::InnerText => PropertyValue::Text(Some(collapse_text(el))),
        })
    }
}

impl FormInteraction for StaticPage {
    fn fill(&mut self, element: &ElementHandle, value: &str) -> Result<()> {
        let target = self.target_name(element);
        self.record(Interaction::Filled {
            target,
            value: value.to_string(),
        });
        Ok(())
    }

    fn select_option(&mut self, element: &ElementHandle, value: &str) -> Result<()> {
        let el = self.element(element)?;
        if !select_options(el).iter().any(|o| o.value == value || o.label == value) {
            return Err(AutofillError::SessionProtocol {
                command: "select_option".into(),
                error: format!("no option matching '{}'", value),
            });
        }
        let target = self.target_name(element);
        self.record(Interaction::Selected {
            target,
            value: value.to_string(),
        });
        Ok(())
    }

    fn set_checked(&mut self, element: &ElementHandle, checked: bool) -> Result<()> {
        let target = self.target_name(element);
        self.record(Interaction::Checked { target, checked });
        Ok(())
    }

    fn set_files(&mut self, element: &ElementHandle, paths: &[PathBuf]) -> Result<()> {
        let target = self.target_name(element);
        self.record(Interaction::Files {
            target,
            paths: paths.to_vec(),
        });
        Ok(())
    }

    fn click(
        &mut self,
        element: &ElementHandle,
        _wait: WaitCondition,
        _timeout: Duration,
    ) -> Result<String> {
        let target = self.target_name(element);
        self.record(Interaction::Clicked { target });
        Ok(self.url.clone())
    }

    fn submit(
        &mut self,
        form: &ElementHandle,
        _wait: WaitCondition,
        _timeout: Duration,
    ) -> Result<String> {
        let target = self.target_name(form);
        self.record(Interaction::Submitted { target });
        Ok(self.url.clone())
    }
}
