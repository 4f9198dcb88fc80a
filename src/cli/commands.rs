use std::path::Path;

use crate::browser::session::{BrowserLaunch, BrowserSession};
use crate::browser::static_page::StaticPage;
use crate::form::candidate::Candidate;
use crate::form::field_model::{load_fields, save_fields};
use crate::form::filler::SubmitOutcome;
use crate::form::locator::{HttpMethod, SubmissionTarget, resolve_url};
use crate::form::payload::build_payload;
use crate::net::http::{HttpOptions, build_client, download_page, fetch_html, post_payload};
use crate::platform::catalog::Platform;
use crate::platform::classifier::{classify_platform, platform_hints};
use crate::platform::markup::{find_api_paths, find_inline_apply_link};
use crate::trace::logger::TraceLogger;
use crate::{PostingScan, ScanOptions, fill_posting, scan_posting};

type CmdResult<T> = Result<T, Box<dyn std::error::Error>>;

// ============================================================================
// scan subcommand
// ============================================================================

pub fn cmd_scan(
    url: &str,
    fields_out: Option<&str>,
    target_out: Option<&str>,
    options: &ScanOptions,
    launch: &BrowserLaunch,
    tracer: &TraceLogger,
) -> CmdResult<()> {
    let mut session = BrowserSession::launch(launch)?;
    let scan = scan_posting(&mut session, url, options, tracer);
    session.quit()?;
    let scan = scan?;

    print_scan(&scan);
    write_outputs(&scan, fields_out, target_out)
}

// ============================================================================
// inspect subcommand
// ============================================================================

pub fn cmd_inspect(
    html_path: &str,
    url: &str,
    fields_out: Option<&str>,
    options: &ScanOptions,
    tracer: &TraceLogger,
) -> CmdResult<()> {
    let html = std::fs::read_to_string(html_path)?;
    let mut page = StaticPage::new(url, &html);

    // Saved markup cannot follow links to pages we do not have.
    let options = ScanOptions {
        follow_apply_link: false,
        ..options.clone()
    };
    let scan = scan_posting(&mut page, url, &options, tracer)?;

    print_scan(&scan);
    write_outputs(&scan, fields_out, None)
}

// ============================================================================
// classify subcommand
// ============================================================================

pub fn cmd_classify(url: &str, html_path: Option<&str>, http: &HttpOptions) -> CmdResult<()> {
    let markup = match html_path {
        Some(path) => std::fs::read_to_string(path)?,
        None => fetch_html(&build_client(http)?, url)?,
    };

    let platform = classify_platform(url, &markup);
    println!("Platform: {}", platform);

    for (key, value) in platform_hints(platform, &markup) {
        println!("  {}: {}", key, value);
    }

    let api_paths = find_api_paths(&markup);
    if !api_paths.is_empty() {
        println!("API paths:");
        for path in &api_paths {
            println!("  - {}", path);
        }
    }

    if let Some(link) = find_inline_apply_link(&markup) {
        println!("Apply link: {}", resolve_url(url, &link));
    }

    Ok(())
}

// ============================================================================
// fill subcommand
// ============================================================================

pub fn cmd_fill(
    url: &str,
    submit: bool,
    candidate: &Candidate,
    options: &ScanOptions,
    launch: &BrowserLaunch,
    tracer: &TraceLogger,
) -> CmdResult<()> {
    let mut session = BrowserSession::launch(launch)?;
    let attempt = fill_posting(&mut session, url, candidate, options, submit, tracer);
    session.quit()?;
    let attempt = attempt?;

    print_scan(&attempt.scan);
    println!(
        "Filled {} of {} assigned values",
        attempt.report.filled.len(),
        attempt.assignment.len()
    );
    for key in &attempt.report.missing {
        println!("  missing: {}", key);
    }
    for failure in &attempt.report.failed {
        println!("  failed: {} ({})", failure.identifier, failure.reason);
    }

    match &attempt.submit {
        Some(SubmitOutcome::Submitted { final_url }) => println!("Submitted; now at {}", final_url),
        Some(SubmitOutcome::NoSubmitMechanism { page_url }) => {
            println!("Nothing to submit on {}", page_url)
        }
        Some(SubmitOutcome::Failed { reason }) => println!("Submit failed: {}", reason),
        None => {}
    }

    Ok(())
}

// ============================================================================
// payload subcommand
// ============================================================================

pub fn cmd_payload(fields_path: &str, action: Option<&str>, http: &HttpOptions) -> CmdResult<()> {
    let fields = load_fields(fields_path)?;
    let payload = build_payload(&fields);

    let Some(action) = action else {
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    };

    let mut target = SubmissionTarget::formless(action, Platform::Generic);
    target.method = HttpMethod::Post;
    let response = post_payload(&build_client(http)?, &target, &payload)?;
    println!("{} {}", response.status, response.final_url);
    Ok(())
}

// ============================================================================
// download subcommand
// ============================================================================

pub fn cmd_download(
    url: &str,
    out_dir: &str,
    name: Option<&str>,
    http: &HttpOptions,
) -> CmdResult<()> {
    let client = build_client(http)?;
    let path = download_page(&client, url, Path::new(out_dir), name)?;
    println!("Saved {}", path.display());
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn print_scan(scan: &PostingScan) {
    let target = &scan.target;
    println!("Page: {}", scan.url);
    if let Some(link) = &scan.followed_apply_link {
        println!("  (followed apply link {})", link);
    }
    println!("Platform: {}", target.platform);
    println!(
        "Submit: {:?} {} ({} controls)",
        target.method,
        target.action_url,
        target.submit_controls.len()
    );
    println!(
        "Fields: {} (fingerprint {})",
        scan.collection.fields.len(),
        scan.fingerprint
    );
    for field in &scan.collection.fields {
        println!(
            "  - {} [{}]{} {}",
            field.identifier,
            field.control_kind.as_str(),
            if field.is_required { " *" } else { "" },
            field.label_text
        );
    }
    for scope in scan.collection.unavailable_scopes() {
        println!("  (scope {} not readable)", scope.scope);
    }
    for path in &target.discovered_api_paths {
        println!("  api path: {}", path);
    }
    if let Some(link) = &target.apply_link {
        println!("  apply link: {}", link);
    }
}

fn write_outputs(
    scan: &PostingScan,
    fields_out: Option<&str>,
    target_out: Option<&str>,
) -> CmdResult<()> {
    if let Some(path) = fields_out {
        save_fields(path, &scan.collection.fields)?;
        println!("Wrote {}", path);
    }
    if let Some(path) = target_out {
        std::fs::write(path, serde_json::to_string_pretty(&scan.target)?)?;
        println!("Wrote {}", path);
    }
    Ok(())
}
