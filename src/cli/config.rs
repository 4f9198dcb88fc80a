use std::path::Path;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ScanOptions;
use crate::browser::renderer::WaitCondition;
use crate::browser::session::BrowserLaunch;
use crate::error::{AutofillError, Result};
use crate::form::candidate::Candidate;
use crate::net::http::{HttpOptions, USER_AGENT};

pub const DEFAULT_CONFIG_PATH: &str = "job-autofill.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "job-autofill",
    version,
    about = "Discover, map and fill job application forms"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: job-autofill.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Append a JSONL stage trace to this file
    #[arg(long, global = true)]
    pub trace: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a live posting for fields and its submission target
    Scan {
        #[arg(long)]
        url: String,

        /// Save the discovered fields as JSON
        #[arg(long)]
        fields_out: Option<String>,

        /// Save the submission target as JSON
        #[arg(long)]
        target_out: Option<String>,

        /// Do not follow an "Apply" link when the page has no submit controls
        #[arg(long)]
        no_follow_apply: bool,

        /// Navigation wait: load, domcontentloaded or networkidle
        #[arg(long)]
        wait_until: Option<String>,
    },

    /// Scan saved markup without a browser
    Inspect {
        /// Saved HTML file
        #[arg(long)]
        html: String,

        /// URL the markup was saved from (used to resolve relative actions)
        #[arg(long)]
        url: String,

        #[arg(long)]
        fields_out: Option<String>,
    },

    /// Identify the hiring platform behind a posting
    Classify {
        #[arg(long)]
        url: String,

        /// Read markup from this file instead of fetching the URL
        #[arg(long)]
        html: Option<String>,
    },

    /// Fill a live posting with the configured candidate
    Fill {
        #[arg(long)]
        url: String,

        /// Attempt to submit after filling
        #[arg(long)]
        submit: bool,
    },

    /// Build a placeholder payload from a saved scrape
    Payload {
        /// Fields JSON written by `scan` or `inspect`
        #[arg(long)]
        fields: String,

        /// POST the payload to this action URL
        #[arg(long)]
        action: Option<String>,
    },

    /// Fetch and save a posting's markup
    Download {
        #[arg(long)]
        url: String,

        #[arg(short, long, default_value = "target")]
        out_dir: String,

        /// Base filename (default: derived from the URL)
        #[arg(long)]
        name: Option<String>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `job-autofill.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub candidate: Candidate,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_program")]
    pub program: String,

    #[serde(default = "default_server_script")]
    pub server_script: String,

    #[serde(default = "default_engine")]
    pub engine: String,

    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_wait_until")]
    pub wait_until: String,

    #[serde(default = "default_sixty_seconds")]
    pub load_timeout_ms: u64,

    #[serde(default = "default_sixty_seconds")]
    pub settle_timeout_ms: u64,

    #[serde(default = "default_true")]
    pub follow_apply_link: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            server_script: default_server_script(),
            engine: default_engine(),
            headless: true,
            wait_until: default_wait_until(),
            load_timeout_ms: 60_000,
            settle_timeout_ms: 60_000,
            follow_apply_link: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_twenty")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    pub path: Option<String>,
}

// Serde default helpers
fn default_program() -> String { "node".to_string() }
fn default_server_script() -> String { "node/browser_server.js".to_string() }
fn default_engine() -> String { "chromium".to_string() }
fn default_wait_until() -> String { "networkidle".to_string() }
fn default_true() -> bool { true }
fn default_sixty_seconds() -> u64 { 60_000 }
fn default_twenty() -> u64 { 20 }
fn default_user_agent() -> String { USER_AGENT.to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Parse a config file, reporting both unreadable and malformed files.
pub fn read_config(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| AutofillError::io(path, e))?;
    serde_yaml::from_str(&content).map_err(|e| AutofillError::Config {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load config from a YAML file. Returns defaults if the file is missing;
/// a malformed file is reported and also falls back to defaults.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = Path::new(path.unwrap_or(DEFAULT_CONFIG_PATH));
    match read_config(config_path) {
        Ok(config) => config,
        Err(e @ AutofillError::Config { .. }) => {
            warn!(error = %e, "malformed config file; using defaults");
            AppConfig::default()
        }
        Err(e) => {
            debug!(error = %e, "no config file; using defaults");
            AppConfig::default()
        }
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Scan options from the browser section, with an optional CLI override of
/// the wait condition. Unknown wait names fall back to network idle.
pub fn build_scan_options(
    browser: &BrowserConfig,
    wait_until: Option<&str>,
    no_follow_apply: bool,
) -> ScanOptions {
    let wait = wait_until.unwrap_or(&browser.wait_until);
    ScanOptions {
        wait_until: WaitCondition::parse(wait).unwrap_or_else(|| {
            warn!(wait_until = %wait, "unknown wait condition; using networkidle");
            WaitCondition::NetworkIdle
        }),
        load_timeout: Duration::from_millis(browser.load_timeout_ms),
        settle_timeout: Duration::from_millis(browser.settle_timeout_ms),
        follow_apply_link: browser.follow_apply_link && !no_follow_apply,
    }
}

pub fn build_browser_launch(browser: &BrowserConfig) -> BrowserLaunch {
    BrowserLaunch {
        program: browser.program.clone(),
        script: browser.server_script.clone(),
        engine: browser.engine.clone(),
        headless: browser.headless,
    }
}

pub fn build_http_options(http: &HttpConfig) -> HttpOptions {
    HttpOptions {
        timeout: Duration::from_secs(http.timeout_secs),
        user_agent: http.user_agent.clone(),
    }
}
