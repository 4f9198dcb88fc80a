use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::{Client, multipart};
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::error::{AutofillError, Result};
use crate::form::locator::{HttpMethod, SubmissionTarget};
use crate::form::payload::Payload;

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());

#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

pub fn build_client(options: &HttpOptions) -> Result<Client> {
    Client::builder()
        .timeout(options.timeout)
        .user_agent(options.user_agent.clone())
        .build()
        .map_err(|e| AutofillError::Http {
            url: String::new(),
            source: e,
        })
}

/// Fetch a page and decode it (charset from headers, lossy on bad bytes).
pub fn fetch_html(client: &Client, url: &str) -> Result<String> {
    let http_err = |e| AutofillError::Http {
        url: url.to_string(),
        source: e,
    };
    debug!(%url, "fetching markup");
    client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.text())
        .map_err(http_err)
}

/// Collapse unsafe runs to `_` and trim separators; never empty.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(name, "_");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_' || c == '-');
    if trimmed.is_empty() {
        "page".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `host_lastsegment` for a URL, `index` standing in for an empty path.
/// Trailing slashes are ignored.
pub fn derive_base_filename(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return sanitize_filename(url);
    };
    let tail = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or("index");
    match parsed.host_str() {
        Some(host) => sanitize_filename(&format!("{}_{}", host, tail)),
        None => sanitize_filename(tail),
    }
}

pub fn save_html(dir: &Path, base: &str, html: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| AutofillError::io(dir, e))?;
    let path = dir.join(format!("{}.html", sanitize_filename(base)));
    std::fs::write(&path, html).map_err(|e| AutofillError::io(&path, e))?;
    Ok(path)
}

/// Fetch `url` and save it under `dir`. Returns the written path.
pub fn download_page(
    client: &Client,
    url: &str,
    dir: &Path,
    basename: Option<&str>,
) -> Result<PathBuf> {
    let html = fetch_html(client, url)?;
    let base = basename
        .map(sanitize_filename)
        .unwrap_or_else(|| derive_base_filename(url));
    let path = save_html(dir, &base, &html)?;
    info!(%url, path = %path.display(), "saved posting markup");
    Ok(path)
}

#[derive(Debug, Clone, Serialize)]
pub struct PostResponse {
    pub status: u16,
    pub final_url: String,
}

/// Send a structural payload to a submission target. GET targets get the
/// data as a query string; POST targets are urlencoded, or multipart when
/// files are present.
pub fn post_payload(
    client: &Client,
    target: &SubmissionTarget,
    payload: &Payload,
) -> Result<PostResponse> {
    let url = target.action_url.as_str();
    Url::parse(url).map_err(|e| AutofillError::InvalidUrl {
        url: url.to_string(),
        source: e,
    })?;
    let http_err = |e| AutofillError::Http {
        url: url.to_string(),
        source: e,
    };

    let request = match target.method {
        HttpMethod::Get => client.get(url).query(&payload.data),
        HttpMethod::Post if payload.files.is_empty() => client.post(url).form(&payload.data),
        HttpMethod::Post => {
            let mut form = multipart::Form::new();
            for (name, value) in &payload.data {
                form = form.text(name.clone(), value.clone());
            }
            for (name, file) in &payload.files {
                let part = multipart::Part::bytes(file.content.clone())
                    .file_name(file.filename.clone())
                    .mime_str(&file.content_type)
                    .map_err(http_err)?;
                form = form.part(name.clone(), part);
            }
            client.post(url).multipart(form)
        }
    };

    let response = request.send().map_err(http_err)?;
    let result = PostResponse {
        status: response.status().as_u16(),
        final_url: response.url().to_string(),
    };
    info!(%url, status = result.status, "payload sent");
    Ok(result)
}
