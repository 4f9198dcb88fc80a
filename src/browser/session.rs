use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::browser::renderer::{
    ElementHandle, ElementProperty, FormInteraction, PageRenderer, PropertyValue, Scope,
    SettleOutcome, WaitCondition,
};
use crate::error::{AutofillError, Result};
use crate::form::field_model::SelectOption;

/// Request sent to the engine process over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BrowserRequest {
    Navigate {
        cmd: &'static str,
        url: String,
        wait_until: WaitCondition,
        timeout_ms: u64,
    },
    WaitSettle {
        cmd: &'static str,
        timeout_ms: u64,
    },
    Query {
        cmd: &'static str,
        scope: Scope,
        selector: String,
    },
    QueryWithin {
        cmd: &'static str,
        handle: u64,
        selector: String,
    },
    Attribute {
        cmd: &'static str,
        handle: u64,
        name: String,
    },
    Property {
        cmd: &'static str,
        handle: u64,
        prop: ElementProperty,
    },
    Input {
        cmd: &'static str,
        handle: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        paths: Option<Vec<String>>,
    },
    Activate {
        cmd: &'static str,
        handle: u64,
        wait_until: WaitCondition,
        timeout_ms: u64,
    },
    Handle {
        cmd: &'static str,
        handle: u64,
    },
    Bare {
        cmd: &'static str,
    },
}

impl BrowserRequest {
    pub fn navigate(url: &str, wait_until: WaitCondition, timeout: Duration) -> Self {
        BrowserRequest::Navigate {
            cmd: "navigate",
            url: url.to_string(),
            wait_until,
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn wait_settle(timeout: Duration) -> Self {
        BrowserRequest::WaitSettle {
            cmd: "wait_settle",
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn current_url() -> Self {
        BrowserRequest::Bare { cmd: "current_url" }
    }

    pub fn content() -> Self {
        BrowserRequest::Bare { cmd: "content" }
    }

    pub fn frames() -> Self {
        BrowserRequest::Bare { cmd: "frames" }
    }

    pub fn query(scope: Scope, selector: &str) -> Self {
        BrowserRequest::Query {
            cmd: "query",
            scope,
            selector: selector.to_string(),
        }
    }

    pub fn query_within(handle: u64, selector: &str) -> Self {
        BrowserRequest::QueryWithin {
            cmd: "query_within",
            handle,
            selector: selector.to_string(),
        }
    }

    pub fn attribute(handle: u64, name: &str) -> Self {
        BrowserRequest::Attribute {
            cmd: "attribute",
            handle,
            name: name.to_string(),
        }
    }

    pub fn tag_name(handle: u64) -> Self {
        BrowserRequest::Handle {
            cmd: "tag_name",
            handle,
        }
    }

    pub fn property(handle: u64, prop: ElementProperty) -> Self {
        BrowserRequest::Property {
            cmd: "property",
            handle,
            prop,
        }
    }

    pub fn fill(handle: u64, value: &str) -> Self {
        BrowserRequest::Input {
            cmd: "fill",
            handle,
            value: Some(value.to_string()),
            checked: None,
            paths: None,
        }
    }

    pub fn select_option(handle: u64, value: &str) -> Self {
        BrowserRequest::Input {
            cmd: "select_option",
            handle,
            value: Some(value.to_string()),
            checked: None,
            paths: None,
        }
    }

    pub fn set_checked(handle: u64, checked: bool) -> Self {
        BrowserRequest::Input {
            cmd: "set_checked",
            handle,
            value: None,
            checked: Some(checked),
            paths: None,
        }
    }

    pub fn set_files(handle: u64, paths: &[PathBuf]) -> Self {
        BrowserRequest::Input {
            cmd: "set_files",
            handle,
            value: None,
            checked: None,
            paths: Some(paths.iter().map(|p| p.display().to_string()).collect()),
        }
    }

    pub fn click(handle: u64, wait_until: WaitCondition, timeout: Duration) -> Self {
        BrowserRequest::Activate {
            cmd: "click",
            handle,
            wait_until,
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn submit(handle: u64, wait_until: WaitCondition, timeout: Duration) -> Self {
        BrowserRequest::Activate {
            cmd: "submit",
            handle,
            wait_until,
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn quit() -> Self {
        BrowserRequest::Bare { cmd: "quit" }
    }
}

/// Response received from the engine process over stdout (one JSON line).
#[derive(Debug, Default, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Machine-readable failure class: `timeout`, `navigation`,
    /// `scope_unavailable`, `stale_handle`, `selector`.
    #[serde(default)]
    pub error_kind: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub handles: Option<Vec<u64>>,
    #[serde(default)]
    pub frames: Option<usize>,
    #[serde(default)]
    pub settled: Option<bool>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

/// How to start the engine process.
#[derive(Debug, Clone)]
pub struct BrowserLaunch {
    pub program: String,
    pub script: String,
    pub engine: String,
    pub headless: bool,
}

impl Default for BrowserLaunch {
    fn default() -> Self {
        Self {
            program: "node".into(),
            script: "node/browser_server.js".into(),
            engine: "chromium".into(),
            headless: true,
        }
    }
}

/// A persistent browser session backed by an engine subprocess.
///
/// Commands are sent as NDJSON over stdin, responses read from stdout.
/// The process is shut down by `quit()` or, failing that, on drop.
pub struct BrowserSession {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    current_url: Option<String>,
    closed: bool,
}

impl BrowserSession {
    /// Launch the engine process and wait for its ready line.
    pub fn launch(launch: &BrowserLaunch) -> Result<Self> {
        let mut command = Command::new(&launch.program);
        command
            .arg(&launch.script)
            .arg("--engine")
            .arg(&launch.engine)
            .arg(if launch.headless { "--headless" } else { "--headed" })
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        let mut child = command.spawn().map_err(|e| AutofillError::SubprocessSpawn {
            script: launch.script.clone(),
            source: e,
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            AutofillError::SessionIO("failed to capture stdin of engine process".into())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            AutofillError::SessionIO("failed to capture stdout of engine process".into())
        })?;

        let mut session = BrowserSession {
            child,
            stdin,
            reader: BufReader::new(stdout),
            current_url: None,
            closed: false,
        };

        let response = session.read_response("ready signal")?;
        if !response.ok || response.ready != Some(true) {
            return Err(AutofillError::SessionProtocol {
                command: "launch".into(),
                error: response
                    .error
                    .unwrap_or_else(|| "did not receive ready signal".into()),
            });
        }

        debug!(engine = %launch.engine, headless = launch.headless, "browser session ready");
        Ok(session)
    }

    fn read_response(&mut self, context: &str) -> Result<BrowserResponse> {
        let mut line = String::new();
        self.reader.read_line(&mut line).map_err(|e| {
            AutofillError::SessionIO(format!("failed to read {}: {}", context, e))
        })?;

        if line.trim().is_empty() {
            return Err(AutofillError::SessionIO(format!(
                "empty {} (engine process may have died)",
                context
            )));
        }

        serde_json::from_str(line.trim()).map_err(|e| AutofillError::JsonParse {
            context: context.to_string(),
            source: e,
        })
    }

    /// Send a request and read the response.
    fn send(&mut self, request: &BrowserRequest) -> Result<BrowserResponse> {
        if self.closed {
            return Err(AutofillError::SessionIO("session already closed".into()));
        }

        let json = serde_json::to_string(request).map_err(|e| AutofillError::JsonSerialize {
            context: "BrowserRequest".into(),
            source: e,
        })?;

        writeln!(self.stdin, "{}", json)
            .and_then(|_| self.stdin.flush())
            .map_err(|e| AutofillError::SessionIO(format!("failed to write request: {}", e)))?;

        self.read_response("engine response")
    }

    /// Send a request and verify it succeeded.
    fn send_ok(&mut self, request: &BrowserRequest, command: &str) -> Result<BrowserResponse> {
        let response = self.send(request)?;
        if response.ok {
            Ok(response)
        } else {
            Err(response_error(command, response))
        }
    }

    /// Last URL reported by the engine (cached, no round trip).
    pub fn last_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    /// Shut the engine down. Safe to call more than once.
    pub fn quit(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        // Best-effort: the process may already be gone.
        if let Err(e) = self.send(&BrowserRequest::quit()) {
            debug!(error = %e, "quit request not acknowledged");
        }
        self.closed = true;
        if self.child.try_wait().ok().flatten().is_none() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!("browser session dropped without quit; shutting engine down");
        }
        let _ = self.quit();
    }
}

fn response_error(command: &str, response: BrowserResponse) -> AutofillError {
    let error = response.error.unwrap_or_else(|| "unknown error".into());
    match response.error_kind.as_deref() {
        Some("timeout") => AutofillError::Timeout {
            operation: command.to_string(),
            timeout_ms: 0,
        },
        Some("navigation") => AutofillError::Navigation {
            url: response.url.unwrap_or_default(),
            reason: error,
        },
        Some("scope_unavailable") => AutofillError::ScopeUnavailable {
            scope: command.to_string(),
            reason: error,
        },
        Some("selector") => AutofillError::InvalidSelector {
            selector: String::new(),
            reason: error,
        },
        _ => AutofillError::SessionProtocol {
            command: command.to_string(),
            error,
        },
    }
}

fn missing(command: &str, what: &str) -> AutofillError {
    AutofillError::SessionProtocol {
        command: command.into(),
        error: format!("no {} in response", what),
    }
}

fn parse_property(prop: ElementProperty, value: Option<Value>) -> Result<PropertyValue> {
    let value = value.unwrap_or(Value::Null);
    match prop {
        ElementProperty::Checked => Ok(PropertyValue::Flag(value.as_bool().unwrap_or(false))),
        ElementProperty::Options => match value {
            Value::Null => Ok(PropertyValue::Text(None)),
            other => {
                let options: Vec<SelectOption> =
                    serde_json::from_value(other).map_err(|e| AutofillError::JsonParse {
                        context: "select options".into(),
                        source: e,
                    })?;
                Ok(PropertyValue::Options(options))
            }
        },
        ElementProperty::Value | ElementProperty::LabelText | ElementProperty::InnerText => {
            Ok(PropertyValue::Text(value.as_str().map(str::to_string)))
        }
    }
}

impl PageRenderer for BrowserSession {
    fn navigate(&mut self, url: &str, wait: WaitCondition, timeout: Duration) -> Result<()> {
        let response = self.send(&BrowserRequest::navigate(url, wait, timeout))?;
        if !response.ok {
            return Err(match response.error_kind.as_deref() {
                Some("timeout") => AutofillError::Timeout {
                    operation: format!("navigate {}", url),
                    timeout_ms: timeout.as_millis() as u64,
                },
                _ => AutofillError::Navigation {
                    url: url.to_string(),
                    reason: response.error.unwrap_or_else(|| "unknown error".into()),
                },
            });
        }
        self.current_url = Some(response.url.unwrap_or_else(|| url.to_string()));
        Ok(())
    }

    fn current_url(&mut self) -> Result<String> {
        let response = self.send_ok(&BrowserRequest::current_url(), "current_url")?;
        let url = response.url.ok_or_else(|| missing("current_url", "url"))?;
        self.current_url = Some(url.clone());
        Ok(url)
    }

    fn content(&mut self) -> Result<String> {
        let response = self.send_ok(&BrowserRequest::content(), "content")?;
        response.html.ok_or_else(|| missing("content", "html"))
    }

    fn wait_for_settle(&mut self, timeout: Duration) -> Result<SettleOutcome> {
        let response = self.send(&BrowserRequest::wait_settle(timeout))?;
        if !response.ok && response.error_kind.as_deref() != Some("timeout") {
            return Err(response_error("wait_settle", response));
        }
        Ok(match response.settled {
            Some(true) if response.ok => SettleOutcome::Settled,
            _ => SettleOutcome::TimedOut,
        })
    }

    fn frames(&mut self) -> Result<Vec<Scope>> {
        let response = self.send_ok(&BrowserRequest::frames(), "frames")?;
        let count = response.frames.unwrap_or(0);
        Ok((0..count).map(Scope::Frame).collect())
    }

    fn query_all(&mut self, scope: Scope, selector: &str) -> Result<Vec<ElementHandle>> {
        let response = self.send(&BrowserRequest::query(scope, selector))?;
        if !response.ok {
            return Err(match response_error("query", response) {
                AutofillError::ScopeUnavailable { reason, .. } => AutofillError::ScopeUnavailable {
                    scope: scope.to_string(),
                    reason,
                },
                AutofillError::InvalidSelector { reason, .. } => AutofillError::InvalidSelector {
                    selector: selector.to_string(),
                    reason,
                },
                other => other,
            });
        }
        Ok(response
            .handles
            .unwrap_or_default()
            .into_iter()
            .map(|id| ElementHandle { scope, id })
            .collect())
    }

    fn query_within(
        &mut self,
        element: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>> {
        let response = self.send_ok(
            &BrowserRequest::query_within(element.id, selector),
            "query_within",
        )?;
        Ok(response
            .handles
            .unwrap_or_default()
            .into_iter()
            .map(|id| ElementHandle {
                scope: element.scope,
                id,
            })
            .collect())
    }

    fn attribute(&mut self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        let response = self.send_ok(&BrowserRequest::attribute(element.id, name), "attribute")?;
        Ok(response
            .value
            .and_then(|v| v.as_str().map(str::to_string)))
    }

    fn tag_name(&mut self, element: &ElementHandle) -> Result<String> {
        let response = self.send_ok(&BrowserRequest::tag_name(element.id), "tag_name")?;
        response
            .tag
            .map(|t| t.to_ascii_lowercase())
            .ok_or_else(|| missing("tag_name", "tag"))
    }

    fn property(
        &mut self,
        element: &ElementHandle,
        prop: ElementProperty,
    ) -> Result<PropertyValue> {
        let response = self.send_ok(&BrowserRequest::property(element.id, prop), "property")?;
        parse_property(prop, response.value)
    }
}

impl FormInteraction for BrowserSession {
    fn fill(&mut self, element: &ElementHandle, value: &str) -> Result<()> {
        self.send_ok(&BrowserRequest::fill(element.id, value), "fill")?;
        Ok(())
    }

    fn select_option(&mut self, element: &ElementHandle, value: &str) -> Result<()> {
        self.send_ok(
            &BrowserRequest::select_option(element.id, value),
            "select_option",
        )?;
        Ok(())
    }

    fn set_checked(&mut self, element: &ElementHandle, checked: bool) -> Result<()> {
        self.send_ok(
            &BrowserRequest::set_checked(element.id, checked),
            "set_checked",
        )?;
        Ok(())
    }

    fn set_files(&mut self, element: &ElementHandle, paths: &[PathBuf]) -> Result<()> {
        self.send_ok(&BrowserRequest::set_files(element.id, paths), "set_files")?;
        Ok(())
    }

    fn click(
        &mut self,
        element: &ElementHandle,
        wait: WaitCondition,
        timeout: Duration,
    ) -> Result<String> {
        let response = self.send_ok(&BrowserRequest::click(element.id, wait, timeout), "click")?;
        let url = response.url.ok_or_else(|| missing("click", "url"))?;
        self.current_url = Some(url.clone());
        Ok(url)
    }

    fn submit(
        &mut self,
        form: &ElementHandle,
        wait: WaitCondition,
        timeout: Duration,
    ) -> Result<String> {
        let response = self.send_ok(&BrowserRequest::submit(form.id, wait, timeout), "submit")?;
        let url = response.url.ok_or_else(|| missing("submit", "url"))?;
        self.current_url = Some(url.clone());
        Ok(url)
    }
}
