use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AutofillError>;

#[derive(Debug, Error)]
pub enum AutofillError {
    /// Browser engine subprocess failed to spawn
    #[error("failed to spawn {script} (is Node.js installed?): {source}")]
    SubprocessSpawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the engine subprocess failed
    #[error("browser session I/O: {0}")]
    SessionIO(String),

    /// The engine answered a command with `ok: false` or a malformed body
    #[error("browser command '{command}' failed: {error}")]
    SessionProtocol { command: String, error: String },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A bounded wait expired. Callers usually degrade instead of failing.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// The engine could not load the page at all.
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// A document or frame that cannot be introspected (e.g. cross-origin).
    #[error("scope {scope} unavailable: {reason}")]
    ScopeUnavailable { scope: String, reason: String },

    #[error("element handle {0} is no longer valid")]
    StaleHandle(u64),

    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl AutofillError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AutofillError::Timeout { .. })
    }

    /// The engine connection itself is broken; nothing further can be read.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AutofillError::SubprocessSpawn { .. }
                | AutofillError::SessionIO(_)
                | AutofillError::JsonParse { .. }
                | AutofillError::JsonSerialize { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AutofillError::Io {
            path: path.into(),
            source,
        }
    }
}
