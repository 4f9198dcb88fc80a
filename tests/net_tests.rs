use job_autofill::error::AutofillError;
use job_autofill::form::field_model::{ControlKind, FieldDescriptor};
use job_autofill::form::locator::SubmissionTarget;
use job_autofill::form::payload::build_payload;
use job_autofill::net::http::{
    HttpOptions, build_client, derive_base_filename, post_payload, sanitize_filename, save_html,
};
use job_autofill::platform::catalog::Platform;
use pretty_assertions::assert_eq;

// ============================================================================
// Filenames
// ============================================================================

#[test]
fn sanitize_collapses_unsafe_runs() {
    assert_eq!(sanitize_filename("Senior Engineer (Remote)"), "Senior_Engineer_Remote");
    assert_eq!(sanitize_filename("a//b??c.html"), "a_b_c.html");
    assert_eq!(sanitize_filename("__draft__"), "draft");
    assert_eq!(sanitize_filename("???"), "page");
    assert_eq!(sanitize_filename(""), "page");
}

#[test]
fn base_filename_from_host_and_last_segment() {
    assert_eq!(
        derive_base_filename("https://boards.greenhouse.io/acme/jobs/4012345"),
        "boards.greenhouse.io_4012345"
    );
    assert_eq!(
        derive_base_filename("https://jobs.lever.co/acme/abc-123/"),
        "jobs.lever.co_abc-123"
    );
    assert_eq!(derive_base_filename("https://careers.acme.test"), "careers.acme.test_index");
    assert_eq!(derive_base_filename("not a url"), "not_a_url");
}

#[test]
fn save_html_creates_directory_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("pages");

    let path = save_html(&out, "jobs.lever.co/acme", "<html></html>").unwrap();
    assert_eq!(path, out.join("jobs.lever.co_acme.html"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");
}

// ============================================================================
// Payload posting
// ============================================================================

#[test]
fn default_http_options() {
    let options = HttpOptions::default();
    assert_eq!(options.timeout.as_secs(), 20);
    assert!(options.user_agent.starts_with("Mozilla/5.0"));
    assert!(build_client(&options).is_ok());
}

#[test]
fn posting_to_a_relative_action_is_rejected_before_sending() {
    let client = build_client(&HttpOptions::default()).unwrap();
    let target = SubmissionTarget::formless("/apply", Platform::Generic);
    let payload = build_payload(&[FieldDescriptor::new("email", ControlKind::Email)]);

    let err = post_payload(&client, &target, &payload).unwrap_err();
    assert!(matches!(err, AutofillError::InvalidUrl { .. }));
    assert!(err.to_string().contains("/apply"));
}
