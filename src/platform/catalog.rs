use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Applicant-tracking platforms the classifier knows about.
///
/// `ALL` is the catalog order; it decides ties in URL scoring and the
/// first-match order for markup indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Greenhouse,
    Lever,
    Workday,
    SmartRecruiters,
    Workable,
    #[serde(rename = "ashbyhq")]
    Ashby,
    Generic,
}

/// A named token pulled out of raw markup for one platform.
pub struct ExtractionRule {
    pub key: &'static str,
    pub pattern: &'static Lazy<Regex>,
}

static ASHBY_FORM_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)"sourceFormDefinitionId"\s*:\s*"([a-f0-9-]{10,})""#).unwrap()
});
static ASHBY_RECAPTCHA_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"recaptchaPublicSiteKey"\s*:\s*"([^"]+)""#).unwrap());

static ASHBY_RULES: [ExtractionRule; 2] = [
    ExtractionRule {
        key: "form_id",
        pattern: &ASHBY_FORM_ID,
    },
    ExtractionRule {
        key: "recaptcha_site_key",
        pattern: &ASHBY_RECAPTCHA_KEY,
    },
];

impl Platform {
    /// Every detectable platform, in catalog order. `Generic` is not listed.
    pub const ALL: [Platform; 6] = [
        Platform::Greenhouse,
        Platform::Lever,
        Platform::Workday,
        Platform::SmartRecruiters,
        Platform::Workable,
        Platform::Ashby,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Platform::Greenhouse => "greenhouse",
            Platform::Lever => "lever",
            Platform::Workday => "workday",
            Platform::SmartRecruiters => "smartrecruiters",
            Platform::Workable => "workable",
            Platform::Ashby => "ashbyhq",
            Platform::Generic => "generic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Platform::ALL
            .into_iter()
            .chain([Platform::Generic])
            .find(|p| p.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Lower-case substrings of the page URL that identify the platform.
    pub fn url_indicators(&self) -> &'static [&'static str] {
        match self {
            Platform::Greenhouse => &["greenhouse.io", "boards.greenhouse.io"],
            Platform::Lever => &["jobs.lever.co", "lever.co"],
            Platform::Workday => &["myworkdayjobs.com"],
            Platform::SmartRecruiters => &["smartrecruiters.com"],
            Platform::Workable => &["workable.com", "apply.workable.com"],
            Platform::Ashby => &["ashbyhq.com"],
            Platform::Generic => &[],
        }
    }

    /// Lower-case substrings of the page markup that identify the platform.
    pub fn text_indicators(&self) -> &'static [&'static str] {
        match self {
            Platform::Greenhouse => &["grnhse"],
            Platform::Lever => &["lever"],
            Platform::Workday => &["/wday/cxs/", "workday"],
            Platform::SmartRecruiters => &["smartrecruiters"],
            Platform::Workable => &["workable"],
            Platform::Ashby => &["ashbyprd.com", "recaptchapublicsitekey"],
            Platform::Generic => &[],
        }
    }

    pub fn extraction_rules(&self) -> &'static [ExtractionRule] {
        match self {
            Platform::Ashby => &ASHBY_RULES,
            _ => &[],
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
