use serde::{Deserialize, Serialize};

/// Contact block of a candidate profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// Handle (`jane-doe`) or full profile URL.
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub github: String,
    /// Bare domain (`janedoe.dev`) or full URL.
    #[serde(default)]
    pub website: String,
}

/// Read-only candidate attributes used to fill application forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub contact: Contact,
}

impl Candidate {
    /// Explicit full name, else first and last joined.
    pub fn full_name(&self) -> String {
        if !self.full_name.trim().is_empty() {
            return self.full_name.clone();
        }
        [self.first_name.trim(), self.last_name.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn linkedin_url(&self) -> Option<String> {
        expand_handle(&self.contact.linkedin, "https://www.linkedin.com/in/")
    }

    pub fn github_url(&self) -> Option<String> {
        expand_handle(&self.contact.github, "https://github.com/")
    }

    pub fn website_url(&self) -> Option<String> {
        expand_handle(&self.contact.website, "https://")
    }
}

fn is_full_url(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

fn expand_handle(raw: &str, prefix: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        None
    } else if is_full_url(raw) {
        Some(raw.to_string())
    } else {
        Some(format!("{}{}", prefix, raw))
    }
}
