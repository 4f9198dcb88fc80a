use std::time::Duration;

use clap::Parser;
use job_autofill::browser::renderer::WaitCondition;
use job_autofill::cli::config::{
    AppConfig, Cli, Commands, build_browser_launch, build_http_options, build_scan_options,
    load_config, read_config,
};
use job_autofill::error::AutofillError;
use job_autofill::logging::level_for;
use job_autofill::net::http::USER_AGENT;
use pretty_assertions::assert_eq;

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_scan_minimal() {
    let cli = Cli::parse_from(["job-autofill", "scan", "--url", "https://x.test/jobs/1"]);
    match cli.command {
        Commands::Scan {
            url,
            fields_out,
            target_out,
            no_follow_apply,
            wait_until,
        } => {
            assert_eq!(url, "https://x.test/jobs/1");
            assert_eq!(fields_out, None);
            assert_eq!(target_out, None);
            assert!(!no_follow_apply);
            assert_eq!(wait_until, None);
        }
        _ => panic!("Expected Scan command"),
    }
    assert_eq!(cli.verbose, 0);
    assert_eq!(cli.config, None);
}

#[test]
fn cli_parse_scan_all_args() {
    let cli = Cli::parse_from([
        "job-autofill",
        "-vv",
        "scan",
        "--url",
        "https://x.test/jobs/1",
        "--fields-out",
        "fields.json",
        "--target-out",
        "target.json",
        "--no-follow-apply",
        "--wait-until",
        "load",
        "--config",
        "custom.yaml",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
    match cli.command {
        Commands::Scan {
            fields_out,
            target_out,
            no_follow_apply,
            wait_until,
            ..
        } => {
            assert_eq!(fields_out.as_deref(), Some("fields.json"));
            assert_eq!(target_out.as_deref(), Some("target.json"));
            assert!(no_follow_apply);
            assert_eq!(wait_until.as_deref(), Some("load"));
        }
        _ => panic!("Expected Scan command"),
    }
}

#[test]
fn cli_parse_other_subcommands() {
    let cli = Cli::parse_from([
        "job-autofill",
        "inspect",
        "--html",
        "saved.html",
        "--url",
        "https://x.test/",
    ]);
    assert!(matches!(cli.command, Commands::Inspect { fields_out: None, .. }));

    let cli = Cli::parse_from(["job-autofill", "classify", "--url", "https://x.test/"]);
    assert!(matches!(cli.command, Commands::Classify { html: None, .. }));

    let cli = Cli::parse_from(["job-autofill", "fill", "--url", "https://x.test/", "--submit"]);
    assert!(matches!(cli.command, Commands::Fill { submit: true, .. }));

    let cli = Cli::parse_from(["job-autofill", "payload", "--fields", "fields.json"]);
    assert!(matches!(cli.command, Commands::Payload { action: None, .. }));

    let cli = Cli::parse_from(["job-autofill", "download", "--url", "https://x.test/"]);
    match cli.command {
        Commands::Download { out_dir, name, .. } => {
            assert_eq!(out_dir, "target");
            assert_eq!(name, None);
        }
        _ => panic!("Expected Download command"),
    }
}

#[test]
fn cli_requires_a_subcommand() {
    assert!(Cli::try_parse_from(["job-autofill"]).is_err());
    assert!(Cli::try_parse_from(["job-autofill", "scan"]).is_err());
}

#[test]
fn verbosity_maps_to_levels() {
    assert_eq!(level_for(0), "warn");
    assert_eq!(level_for(1), "info");
    assert_eq!(level_for(2), "debug");
    assert_eq!(level_for(5), "trace");
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn missing_config_file_gives_defaults() {
    let config = load_config(Some("/nonexistent/job-autofill.yaml"));
    assert_eq!(config.browser.server_script, "node/browser_server.js");
    assert_eq!(config.browser.load_timeout_ms, 60_000);
    assert_eq!(config.browser.settle_timeout_ms, 60_000);
    assert!(config.browser.headless);
    assert_eq!(config.http.timeout_secs, 20);
    assert_eq!(config.http.user_agent, USER_AGENT);
    assert_eq!(config.trace.path, None);
    assert_eq!(config.candidate.full_name(), "");
}

#[test]
fn partial_config_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("job-autofill.yaml");
    std::fs::write(
        &path,
        r#"
browser:
  engine: firefox
  headless: false
  load_timeout_ms: 5000
candidate:
  first_name: Ada
  last_name: Lovelace
  contact:
    linkedin: ada
trace:
  path: trace.jsonl
"#,
    )
    .unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.browser.engine, "firefox");
    assert!(!config.browser.headless);
    assert_eq!(config.browser.load_timeout_ms, 5000);
    assert_eq!(config.browser.settle_timeout_ms, 60_000);
    assert_eq!(config.browser.wait_until, "networkidle");
    assert_eq!(config.http.timeout_secs, 20);
    assert_eq!(config.candidate.full_name(), "Ada Lovelace");
    assert_eq!(
        config.candidate.linkedin_url().as_deref(),
        Some("https://www.linkedin.com/in/ada")
    );
    assert_eq!(config.trace.path.as_deref(), Some("trace.jsonl"));
}

#[test]
fn malformed_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "browser: [not, a, map\n").unwrap();

    let err = read_config(&path).unwrap_err();
    assert!(matches!(err, AutofillError::Config { .. }));

    let config = load_config(path.to_str());
    assert_eq!(config.browser.engine, "chromium");
}

// ============================================================================
// Config Builder Tests
// ============================================================================

#[test]
fn scan_options_from_config_and_flags() {
    let config = AppConfig::default();
    let options = build_scan_options(&config.browser, None, false);
    assert_eq!(options.wait_until, WaitCondition::NetworkIdle);
    assert_eq!(options.load_timeout, Duration::from_secs(60));
    assert_eq!(options.settle_timeout, Duration::from_secs(60));
    assert!(options.follow_apply_link);

    let options = build_scan_options(&config.browser, Some("domcontentloaded"), true);
    assert_eq!(options.wait_until, WaitCondition::DomContentLoaded);
    assert!(!options.follow_apply_link);

    let options = build_scan_options(&config.browser, Some("whenever"), false);
    assert_eq!(options.wait_until, WaitCondition::NetworkIdle);
}

#[test]
fn launch_and_http_options_from_config() {
    let mut config = AppConfig::default();
    config.browser.engine = "webkit".into();
    config.http.timeout_secs = 5;

    let launch = build_browser_launch(&config.browser);
    assert_eq!(launch.program, "node");
    assert_eq!(launch.script, "node/browser_server.js");
    assert_eq!(launch.engine, "webkit");
    assert!(launch.headless);

    let http = build_http_options(&config.http);
    assert_eq!(http.timeout, Duration::from_secs(5));
    assert_eq!(http.user_agent, USER_AGENT);
}
