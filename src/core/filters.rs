use serde::{Deserialize, Serialize};
use crate::core::parsing::contains_term;
use crate::models::{FilterParams, UserProfile};

/// Filters handed to candidate retrieval
///
/// Retrieval applies these as plain predicates; no tier logic happens there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Domain tag such as "cs", "business" or "law"
    pub field: Option<String>,
    /// Country allow-list; empty means any country
    pub countries: Vec<String>,
    /// Only programs ranked at or above this position
    pub max_ranking: Option<u32>,
}

/// Field tags and the phrases that map onto them
const FIELD_TAGS: &[(&str, &[&str])] = &[
    (
        "cs",
        &["computer science", "software", "computing", "artificial intelligence", "ai", "cs", "computer engineering"],
    ),
    ("data", &["data science", "machine learning", "analytics", "statistics", "data"]),
    (
        "engineering",
        &["engineering", "mechanical", "electrical", "civil", "robotics", "manufacturing"],
    ),
    ("finance", &["finance", "financial", "accounting", "investment", "banking"]),
    ("business", &["business", "mba", "management", "marketing", "economics"]),
    ("law", &["law", "legal", "llm", "jurisprudence"]),
    ("medicine", &["medicine", "medical", "public health", "nursing", "pharmacy"]),
    ("education", &["education", "teaching", "pedagogy"]),
    ("design", &["design", "architecture", "hci", "ux"]),
];

/// Country aliases mapped onto the names used in the program catalogue
const COUNTRY_ALIASES: &[(&str, &[&str])] = &[
    ("United States", &["us", "usa", "u.s.", "u.s.a.", "united states", "america", "united states of america"]),
    ("United Kingdom", &["uk", "u.k.", "united kingdom", "britain", "great britain", "england", "scotland"]),
    ("Canada", &["canada", "ca"]),
    ("Australia", &["australia", "au"]),
    ("Germany", &["germany", "de", "deutschland"]),
    ("France", &["france", "fr"]),
    ("Netherlands", &["netherlands", "holland", "nl"]),
    ("Switzerland", &["switzerland", "ch"]),
    ("Singapore", &["singapore", "sg"]),
    ("Hong Kong", &["hong kong", "hk"]),
    ("Japan", &["japan", "jp"]),
];

/// Map a free-text target field onto a domain tag
///
/// The longest matching phrase wins, so "data science" resolves to "data"
/// and "financial engineering" to "engineering".
pub fn detect_field(text: &str) -> Option<&'static str> {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    // Exact tag names win
    if let Some((tag, _)) = FIELD_TAGS.iter().find(|(tag, _)| *tag == lower) {
        return Some(tag);
    }

    let mut best: Option<(&'static str, usize)> = None;
    for (tag, phrases) in FIELD_TAGS {
        for phrase in phrases.iter() {
            if contains_term(&lower, phrase) && best.map_or(true, |(_, len)| phrase.len() > len) {
                best = Some((tag, phrase.len()));
            }
        }
    }
    best.map(|(tag, _)| tag)
}

/// Normalise a user-typed country name to its catalogue spelling
pub fn normalize_country(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();

    let canonical = COUNTRY_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&lower.as_str()))
        .map(|(canonical, _)| canonical.to_string());

    Some(canonical.unwrap_or_else(|| trimmed.to_string()))
}

/// Normalise and de-duplicate a country list, keeping first-seen order
pub fn normalize_countries<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if let Some(country) = normalize_country(name.as_ref()) {
            if !out.contains(&country) {
                out.push(country);
            }
        }
    }
    out
}

impl SearchFilters {
    /// Build filters from explicit request parameters, falling back to the profile
    ///
    /// Explicit values always win; missing ones are inferred from the
    /// profile's target field and preferred countries.
    pub fn resolve(params: Option<&FilterParams>, profile: &UserProfile) -> Self {
        let params = params.cloned().unwrap_or_default();

        let field = params
            .field
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .or_else(|| {
                profile
                    .target_field
                    .as_deref()
                    .and_then(detect_field)
                    .map(str::to_string)
            });

        let countries = match params.countries {
            Some(countries) => normalize_countries(&countries),
            None => normalize_countries(&profile.preferred_countries),
        };

        Self {
            field,
            countries,
            max_ranking: params.max_ranking,
        }
    }
}
