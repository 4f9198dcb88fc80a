#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use job_autofill::browser::renderer::{
    ElementHandle, ElementProperty, FormInteraction, PageRenderer, PropertyValue, Scope,
    SettleOutcome, WaitCondition,
};
use job_autofill::browser::static_page::StaticPage;
use job_autofill::error::{AutofillError, Result};
use job_autofill::form::candidate::{Candidate, Contact};
use job_autofill::trace::logger::TraceLogger;
use job_autofill::{PostingScan, ScanOptions, scan_posting};

pub const POSTING_URL: &str = "https://careers.acme.test/jobs/42";

/// Posting with a plain form: text/email/tel/file inputs, a select, a radio
/// group, a checkbox and a submit button.
pub const APPLICATION_FORM: &str = r#"
<html><body>
  <h1>Backend Engineer</h1>
  <form action="/apply" method="post" enctype="multipart/form-data">
    <label for="first_name">First Name</label>
    <input id="first_name" name="first_name" type="text" required>
    <label>Last Name <input name="last_name" type="text"></label>
    <input name="email" type="email" placeholder="you@example.com" aria-required="true">
    <input name="phone" type="tel">
    <input name="LinkedIn_URL" type="url">
    <input name="resume" type="file">
    <select name="country">
      <option value="">Choose</option>
      <option value="us">United States</option>
      <option value="ca" selected>Canada</option>
    </select>
    <input type="radio" name="authorized" value="yes">
    <input type="radio" name="authorized" value="no">
    <input type="checkbox" name="newsletter">
    <textarea name="cover_letter">Hello</textarea>
    <input type="hidden" name="token" value="abc123">
    <button type="submit">Submit</button>
  </form>
</body></html>
"#;

pub fn candidate() -> Candidate {
    Candidate {
        first_name: "Sriram".into(),
        last_name: "Rao".into(),
        full_name: String::new(),
        location: "Toronto".into(),
        contact: Contact {
            email: "sriram@example.com".into(),
            phone: "+1-416-555-0100".into(),
            linkedin: "sriram-rao".into(),
            github: "srao".into(),
            website: "sriram.dev".into(),
        },
    }
}

pub fn quick_options() -> ScanOptions {
    ScanOptions {
        load_timeout: Duration::from_millis(50),
        settle_timeout: Duration::from_millis(50),
        ..ScanOptions::default()
    }
}

/// Scan a single saved page through the static renderer.
pub fn scan_static(url: &str, html: &str) -> PostingScan {
    let mut page = StaticPage::new(url, html);
    scan_posting(&mut page, url, &quick_options(), &TraceLogger::disabled())
        .expect("static scan succeeds")
}

/// Static page whose navigation, settling, frame listing or clicks can be
/// made to fail, standing in for a slow or misbehaving engine.
pub struct FlakyPage {
    pub inner: StaticPage,
    pub navigate_times_out: bool,
    pub settle: Settle,
    pub frames_fail: bool,
    pub clicks_fail: bool,
}

/// How [`FlakyPage::wait_for_settle`] behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    Normal,
    ReportsTimeout,
    ErrorsWithTimeout,
}

impl FlakyPage {
    pub fn new(inner: StaticPage) -> Self {
        Self {
            inner,
            navigate_times_out: false,
            settle: Settle::Normal,
            frames_fail: false,
            clicks_fail: false,
        }
    }
}

impl PageRenderer for FlakyPage {
    fn navigate(&mut self, url: &str, wait: WaitCondition, timeout: Duration) -> Result<()> {
        self.inner.navigate(url, wait, timeout)?;
        if self.navigate_times_out {
            return Err(AutofillError::Timeout {
                operation: format!("navigate {}", url),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    fn current_url(&mut self) -> Result<String> {
        self.inner.current_url()
    }

    fn content(&mut self) -> Result<String> {
        self.inner.content()
    }

    fn wait_for_settle(&mut self, timeout: Duration) -> Result<SettleOutcome> {
        match self.settle {
            Settle::Normal => self.inner.wait_for_settle(timeout),
            Settle::ReportsTimeout => Ok(SettleOutcome::TimedOut),
            Settle::ErrorsWithTimeout => Err(AutofillError::Timeout {
                operation: "wait_for_settle".into(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    fn frames(&mut self) -> Result<Vec<Scope>> {
        if self.frames_fail {
            return Err(AutofillError::ScopeUnavailable {
                scope: "frames".into(),
                reason: "frame tree detached".into(),
            });
        }
        self.inner.frames()
    }

    fn query_all(&mut self, scope: Scope, selector: &str) -> Result<Vec<ElementHandle>> {
        self.inner.query_all(scope, selector)
    }

    fn query_within(
        &mut self,
        element: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>> {
        self.inner.query_within(element, selector)
    }

    fn attribute(&mut self, element: &ElementHandle, name: &str) -> Result<Option<String>> {
        self.inner.attribute(element, name)
    }

    fn tag_name(&mut self, element: &ElementHandle) -> Result<String> {
        self.inner.tag_name(element)
    }

    fn property(
        &mut self,
        element: &ElementHandle,
        prop: ElementProperty,
    ) -> Result<PropertyValue> {
        self.inner.property(element, prop)
    }
}

impl FormInteraction for FlakyPage {
    fn fill(&mut self, element: &ElementHandle, value: &str) -> Result<()> {
        self.inner.fill(element, value)
    }

    fn select_option(&mut self, element: &ElementHandle, value: &str) -> Result<()> {
        self.inner.select_option(element, value)
    }

    fn set_checked(&mut self, element: &ElementHandle, checked: bool) -> Result<()> {
        self.inner.set_checked(element, checked)
    }

    fn set_files(&mut self, element: &ElementHandle, paths: &[PathBuf]) -> Result<()> {
        self.inner.set_files(element, paths)
    }

    fn click(
        &mut self,
        element: &ElementHandle,
        wait: WaitCondition,
        timeout: Duration,
    ) -> Result<String> {
        if self.clicks_fail {
            return Err(AutofillError::Timeout {
                operation: "click".into(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        self.inner.click(element, wait, timeout)
    }

    fn submit(
        &mut self,
        form: &ElementHandle,
        wait: WaitCondition,
        timeout: Duration,
    ) -> Result<String> {
        self.inner.submit(form, wait, timeout)
    }
}
