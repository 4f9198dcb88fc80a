use std::collections::BTreeMap;

use crate::platform::catalog::Platform;

/// Name the platform that rendered a page.
///
/// URL indicators always win over markup indicators, because embedded
/// widgets and third-party scripts routinely mention other platforms.
pub fn classify_platform(url: &str, markup: &str) -> Platform {
    classify_by_url(url)
        .or_else(|| classify_by_markup(markup))
        .unwrap_or(Platform::Generic)
}

/// Score each platform by its longest matching URL indicator; the longest
/// overall wins and ties go to the earlier catalog entry.
pub fn classify_by_url(url: &str) -> Option<Platform> {
    let url = url.to_lowercase();
    let mut best: Option<(usize, Platform)> = None;

    for platform in Platform::ALL {
        let score = platform
            .url_indicators()
            .iter()
            .filter(|indicator| url.contains(*indicator))
            .map(|indicator| indicator.len())
            .max();

        if let Some(score) = score {
            if best.is_none_or(|(top, _)| score > top) {
                best = Some((score, platform));
            }
        }
    }

    best.map(|(_, platform)| platform)
}

/// First catalog entry with any markup indicator present.
pub fn classify_by_markup(markup: &str) -> Option<Platform> {
    let text = markup.to_lowercase();
    Platform::ALL.into_iter().find(|platform| {
        platform
            .text_indicators()
            .iter()
            .any(|token| text.contains(token))
    })
}

/// Platform-specific tokens (internal form id, captcha site key, ...)
/// found in the markup. Empty for platforms without extraction rules.
pub fn platform_hints(platform: Platform, markup: &str) -> BTreeMap<String, String> {
    platform
        .extraction_rules()
        .iter()
        .filter_map(|rule| {
            rule.pattern
                .captures(markup)
                .and_then(|caps| caps.get(1))
                .map(|m| (rule.key.to_string(), m.as_str().to_string()))
        })
        .collect()
}
