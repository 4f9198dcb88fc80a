use job_autofill::browser::static_page::StaticPage;
use job_autofill::form::locator::{
    DEFAULT_ENCODING, HttpMethod, SubmitControl, find_apply_link, locate_form,
    locate_submission_target, resolve_url,
};
use job_autofill::platform::catalog::Platform;
use pretty_assertions::assert_eq;

use crate::common::{APPLICATION_FORM, POSTING_URL};

mod common;

// ============================================================================
// Form path
// ============================================================================

#[test]
fn single_form_with_submit_button() {
    let html = r#"
        <form action="/apply" method="post">
          <input name="email" type="email">
          <button type="submit">Submit</button>
        </form>"#;
    let mut page = StaticPage::new("https://careers.acme.test/jobs/42", html);
    let target = locate_submission_target(&mut page).unwrap();

    assert_eq!(target.action_url, "https://careers.acme.test/apply");
    assert_eq!(target.method, HttpMethod::Post);
    assert_eq!(target.encoding, DEFAULT_ENCODING);
    assert_eq!(
        target.submit_controls,
        vec![SubmitControl {
            name: "".into(),
            value: "Submit".into(),
        }]
    );
    assert_eq!(target.platform, Platform::Generic);
    assert!(target.discovered_api_paths.is_empty());
    assert_eq!(target.apply_link, None);
}

#[test]
fn form_encoding_and_relative_action_are_kept() {
    let mut page = StaticPage::new(POSTING_URL, APPLICATION_FORM);
    let target = locate_form(&mut page).unwrap();
    assert_eq!(target.encoding, "multipart/form-data");
    assert_eq!(target.action_url, "https://careers.acme.test/apply");
    assert_eq!(target.submit_controls.len(), 1);
}

#[test]
fn missing_action_submits_to_page_url() {
    let html = r#"<form><input name="q"><input type="submit" name="go" value="Send"></form>"#;
    let mut page = StaticPage::new(POSTING_URL, html);
    let target = locate_form(&mut page).unwrap();
    assert_eq!(target.action_url, POSTING_URL);
    assert_eq!(target.method, HttpMethod::Get);
    assert_eq!(
        target.submit_controls,
        vec![SubmitControl {
            name: "go".into(),
            value: "Send".into(),
        }]
    );
}

#[test]
fn method_other_than_post_is_get() {
    for (raw, expected) in [
        ("post", HttpMethod::Post),
        ("POST", HttpMethod::Post),
        ("get", HttpMethod::Get),
        ("dialog", HttpMethod::Get),
    ] {
        assert_eq!(HttpMethod::parse(raw), expected, "method {}", raw);
    }
}

#[test]
fn labelled_buttons_and_links_count_as_submit_controls() {
    let html = r##"
        <form action="https://api.acme.test/v1/applications" method="post">
          <input name="title" type="text" value="Submit">
          <a role="button" href="#">Apply now</a>
          <button type="button" name="next">Continue</button>
          <button name="send" value="final">Submit application</button>
        </form>"##;
    let mut page = StaticPage::new(POSTING_URL, html);
    let target = locate_form(&mut page).unwrap();
    assert_eq!(target.action_url, "https://api.acme.test/v1/applications");
    assert_eq!(
        target.submit_controls,
        vec![
            SubmitControl {
                name: "".into(),
                value: "Apply now".into(),
            },
            SubmitControl {
                name: "send".into(),
                value: "final".into(),
            },
        ]
    );
}

#[test]
fn only_first_form_is_used() {
    let html = r#"
        <form action="/search" method="get"><input name="q"></form>
        <form action="/apply" method="post"><button type="submit">Apply</button></form>"#;
    let mut page = StaticPage::new(POSTING_URL, html);
    let target = locate_form(&mut page).unwrap();
    assert_eq!(target.action_url, "https://careers.acme.test/search");
    assert!(target.submit_controls.is_empty());
}

// ============================================================================
// Platform fields
// ============================================================================

#[test]
fn platform_and_hints_filled_even_with_a_form() {
    let html = r#"
        <script>{"sourceFormDefinitionId": "aa11bb22-cc33-dd44", "recaptchaPublicSiteKey": "site-key"}</script>
        <form action="/api/submit" method="post"><button type="submit">Submit</button></form>"#;
    let mut page = StaticPage::new("https://jobs.ashbyhq.com/acme/123/application", html);
    let target = locate_submission_target(&mut page).unwrap();

    assert_eq!(target.platform, Platform::Ashby);
    assert_eq!(
        target.platform_hints.get("form_id").map(String::as_str),
        Some("aa11bb22-cc33-dd44")
    );
    assert_eq!(
        target.platform_hints.get("recaptcha_site_key").map(String::as_str),
        Some("site-key")
    );
    // Submit controls were found, so raw markup hints stay empty.
    assert!(target.discovered_api_paths.is_empty());
}

// ============================================================================
// Formless pages
// ============================================================================

#[test]
fn page_without_form_targets_itself() {
    let html = r#"
        <div id="app">
          <input name="email" type="email">
          <script>fetch("/api/v2/apply?job=42")</script>
          <a href="/jobs/42/apply">Apply for this job</a>
        </div>"#;
    let mut page = StaticPage::new(POSTING_URL, html);
    let target = locate_submission_target(&mut page).unwrap();

    assert_eq!(target.action_url, POSTING_URL);
    assert_eq!(target.method, HttpMethod::Get);
    assert_eq!(target.encoding, DEFAULT_ENCODING);
    assert!(target.submit_controls.is_empty());
    assert_eq!(target.platform, Platform::Generic);
    assert!(target.platform_hints.is_empty());
    assert!(target.discovered_api_paths.contains("/api/v2/apply?job=42"));
    assert_eq!(
        target.apply_link.as_deref(),
        Some("https://careers.acme.test/jobs/42/apply")
    );
}

#[test]
fn bare_page_has_empty_hints() {
    let mut page = StaticPage::new("https://careers.acme.test/", "<p>No openings</p>");
    let target = locate_submission_target(&mut page).unwrap();
    assert_eq!(target.action_url, "https://careers.acme.test/");
    assert!(target.submit_controls.is_empty());
    assert!(target.discovered_api_paths.is_empty());
    assert_eq!(target.apply_link, None);
    assert_eq!(target.platform, Platform::Generic);
}

// ============================================================================
// Apply links and URL resolution
// ============================================================================

#[test]
fn apply_link_skips_fragments_and_scripts() {
    let html = r##"
        <a href="#apply">Apply</a>
        <a href="javascript:openApply()">Apply</a>
        <a href="/about">About us</a>
        <a href="https://jobs.lever.co/acme/42/apply">Apply for this job</a>"##;
    let mut page = StaticPage::new(POSTING_URL, html);
    assert_eq!(
        find_apply_link(&mut page).unwrap().as_deref(),
        Some("https://jobs.lever.co/acme/42/apply")
    );

    let mut none = StaticPage::new(POSTING_URL, r#"<a href="/about">About us</a>"#);
    assert_eq!(find_apply_link(&mut none).unwrap(), None);
}

#[test]
fn resolve_url_handles_relative_absolute_and_garbage() {
    assert_eq!(
        resolve_url("https://careers.acme.test/jobs/42", "apply"),
        "https://careers.acme.test/jobs/apply"
    );
    assert_eq!(
        resolve_url("https://careers.acme.test/jobs/42", "/apply"),
        "https://careers.acme.test/apply"
    );
    assert_eq!(
        resolve_url("https://careers.acme.test/jobs/42", "https://other.test/x"),
        "https://other.test/x"
    );
    assert_eq!(resolve_url("not a url", "/apply"), "/apply");
}
