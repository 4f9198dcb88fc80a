use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::platform::catalog::Platform;

/// Pipeline stage a trace event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Navigate,
    Collect,
    Locate,
    FollowApply,
    Map,
    Fill,
    Submit,
}

#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub stage: Stage,

    pub url: Option<String>,
    pub platform: Option<Platform>,

    pub field_count: Option<usize>,
    pub fingerprint: Option<String>,

    pub detail: Option<String>,
}

impl TraceEvent {
    pub fn now(stage: Stage) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            stage,
            url: None,
            platform: None,
            field_count: None,
            fingerprint: None,
            detail: None,
        }
    }

    pub fn with_url(mut self, url: impl ToString) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_fields(mut self, count: usize, fingerprint: impl ToString) -> Self {
        self.field_count = Some(count);
        self.fingerprint = Some(fingerprint.to_string());
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
