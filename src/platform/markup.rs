use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Relative paths that look like API or apply endpoints.
static API_PATH_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?i)/api/[^\s"']+"#,
        r#"(?i)/graphql[/?][^\s"']*"#,
        r#"(?i)/wday/cxs/[^\s"']+"#,
        r#"(?i)/embed/job_app[^\s"']*"#,
        r#"(?i)/apply[^\s"']*"#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static INLINE_APPLY_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)href=["']([^"']*apply[^"']*)["']"#).unwrap());

/// Every API/apply-shaped path in the markup, deduplicated.
pub fn find_api_paths(markup: &str) -> BTreeSet<String> {
    API_PATH_PATTERNS
        .iter()
        .flat_map(|re| re.find_iter(markup).map(|m| m.as_str().to_string()))
        .collect()
}

/// The first `href` whose target mentions "apply".
pub fn find_inline_apply_link(markup: &str) -> Option<String> {
    INLINE_APPLY_LINK
        .captures(markup)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Find a URL on `domain` anywhere in the markup: bare, quoted, or inside a
/// CSS `url(...)`. Patterns are tried in that order.
pub fn find_url_with_domain(markup: &str, domain: &str) -> Option<String> {
    let domain = regex::escape(domain);
    let patterns = [
        format!(r"(?i)https?://(?:www\.)?{}/[\w-]+", domain),
        format!(r#"(?i)"(https?://[\w.-]*{}[\w/%-]*)"#, domain),
        format!(r#"(?i)url\(["']?(https?://[\w.-]*{}[\w/%-]*)"#, domain),
    ];

    for pattern in &patterns {
        let Ok(re) = Regex::new(pattern) else {
            continue;
        };
        let Some(caps) = re.captures(markup) else {
            continue;
        };
        let found = caps.get(1).or_else(|| caps.get(0))?.as_str();
        let cleaned = found
            .split(['"', '\'', ')'])
            .next()
            .unwrap_or(found)
            .to_string();
        return Some(cleaned);
    }

    None
}
