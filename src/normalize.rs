//! Ingestion policy
//!
//! Collections apply these to every value and key they store or look up.
//! Handlers call the key helpers only to report missing fields.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
}

/// Description stored for a PDF uploaded without one
pub const DEFAULT_PDF_DESCRIPTION: &str = "No description";

/// How the values of a collection are cleaned before they are stored
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValuePolicy {
    /// Remove every whitespace character (contacts, emails)
    StripAll,
    /// Remove leading and trailing whitespace (links, urls)
    Trim,
}

impl ValuePolicy {
    /// Apply the policy, returning `None` for values that end up empty
    pub fn apply(&self, value: &str) -> Option<String> {
        let cleaned = match self {
            ValuePolicy::StripAll => WHITESPACE_REGEX.replace_all(value, "").into_owned(),
            ValuePolicy::Trim => value.trim().to_string(),
        };

        if cleaned.is_empty() { None } else { Some(cleaned) }
    }
}

/// Normalise a key field (year, season, label)
///
/// Returns `None` when the field is blank, which callers treat as missing.
pub fn key_field(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalise an optional key field coming from a request body
pub fn optional_key_field(raw: Option<&str>) -> Option<String> {
    raw.and_then(key_field)
}

/// Normalise a PDF description, falling back to [`DEFAULT_PDF_DESCRIPTION`]
pub fn pdf_description(raw: Option<&str>) -> String {
    raw.and_then(key_field)
        .unwrap_or_else(|| DEFAULT_PDF_DESCRIPTION.to_string())
}
