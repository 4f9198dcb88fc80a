use std::collections::BTreeMap;

use serde::Serialize;

use crate::form::candidate::Candidate;
use crate::form::field_model::FieldDescriptor;

/// Semantic candidate attribute a field can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeCategory {
    FirstName,
    LastName,
    FullName,
    Email,
    Phone,
    LinkedIn,
    GitHub,
    Website,
    Location,
}

impl AttributeCategory {
    /// Priority order; the first category that matches a field wins.
    pub const PRIORITY: [AttributeCategory; 9] = [
        AttributeCategory::FirstName,
        AttributeCategory::LastName,
        AttributeCategory::FullName,
        AttributeCategory::Email,
        AttributeCategory::Phone,
        AttributeCategory::LinkedIn,
        AttributeCategory::GitHub,
        AttributeCategory::Website,
        AttributeCategory::Location,
    ];

    /// Does a normalized identifier belong to this category?
    pub fn matches(&self, n: &str) -> bool {
        match self {
            AttributeCategory::FirstName => n.contains("firstname") || n.contains("givenname"),
            AttributeCategory::LastName => {
                n.contains("lastname") || n.contains("familyname") || n.contains("surname")
            }
            AttributeCategory::FullName => {
                n == "name" || n.contains("fullname") || n.contains("yourname")
            }
            AttributeCategory::Email => n.contains("email"),
            AttributeCategory::Phone => {
                n.contains("phone") || n.contains("tel") || n.contains("mobile")
            }
            AttributeCategory::LinkedIn => n.contains("linkedin"),
            AttributeCategory::GitHub => n.contains("github"),
            AttributeCategory::Website => {
                n.contains("website") || n.ends_with("url") || n.contains("portfolio")
            }
            // A "city_state" field belongs to a separate state control.
            AttributeCategory::Location => {
                n.contains("location") || (n.contains("city") && !n.contains("state"))
            }
        }
    }

    /// The candidate's value for this category, `None` when empty.
    pub fn value_for(&self, candidate: &Candidate) -> Option<String> {
        let value = match self {
            AttributeCategory::FirstName => candidate.first_name.clone(),
            AttributeCategory::LastName => candidate.last_name.clone(),
            AttributeCategory::FullName => candidate.full_name(),
            AttributeCategory::Email => candidate.contact.email.clone(),
            AttributeCategory::Phone => candidate.contact.phone.clone(),
            AttributeCategory::LinkedIn => return candidate.linkedin_url(),
            AttributeCategory::GitHub => return candidate.github_url(),
            AttributeCategory::Website => return candidate.website_url(),
            AttributeCategory::Location => candidate.location.clone(),
        };
        (!value.trim().is_empty()).then_some(value)
    }
}

/// Lower-case and drop everything that is not alphanumeric.
pub fn normalize_identifier(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn categorize(identifier: &str) -> Option<AttributeCategory> {
    let n = normalize_identifier(identifier);
    if n.is_empty() {
        return None;
    }
    AttributeCategory::PRIORITY
        .into_iter()
        .find(|category| category.matches(&n))
}

/// Field identifier → value, built once per fill attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CandidateValueAssignment(BTreeMap<String, String>);

impl CandidateValueAssignment {
    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.0.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

/// Assign candidate values to the fields whose identifiers are recognized.
///
/// Unrecognized fields, and recognized fields whose candidate attribute is
/// empty, are absent from the result.
pub fn map_candidate_values(
    fields: &[FieldDescriptor],
    candidate: &Candidate,
) -> CandidateValueAssignment {
    let mut values = BTreeMap::new();

    for field in fields {
        let Some(category) = categorize(&field.identifier) else {
            continue;
        };
        if let Some(value) = category.value_for(candidate) {
            values.insert(field.identifier.clone(), value);
        }
    }

    CandidateValueAssignment(values)
}
