//! Metadata quality checks and keyword helpers.

use std::collections::BTreeMap;

use serde::Serialize;
use url::Url;

use super::fallback::{LOCAL_KEYWORDS, PRIMARY_KEYWORDS, SECONDARY_KEYWORDS};
use super::page::SeoPage;

pub const TITLE_MIN: usize = 30;
pub const TITLE_MAX: usize = 60;
pub const DESCRIPTION_MIN: usize = 120;
pub const DESCRIPTION_MAX: usize = 160;
pub const KEYWORDS_MAX: usize = 10;

/// Result of [`audit`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoAudit {
    pub is_valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Check lengths and formats. Errors make the page invalid; warnings do not.
pub fn audit(page: &SeoPage) -> SeoAudit {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    let title_len = page.title.chars().count();
    if page.title.trim().is_empty() {
        errors.push("Title is required".to_string());
    } else if title_len > TITLE_MAX {
        warnings.push(format!("Title is longer than {TITLE_MAX} characters"));
    } else if title_len < TITLE_MIN {
        warnings.push(format!("Title is shorter than {TITLE_MIN} characters"));
    }

    let description_len = page.description.chars().count();
    if page.description.trim().is_empty() {
        errors.push("Description is required".to_string());
    } else if description_len > DESCRIPTION_MAX {
        warnings.push(format!(
            "Description is longer than {DESCRIPTION_MAX} characters"
        ));
    } else if description_len < DESCRIPTION_MIN {
        warnings.push(format!(
            "Description is shorter than {DESCRIPTION_MIN} characters"
        ));
    }

    if page.keywords.is_empty() {
        warnings.push("No keywords specified".to_string());
    } else if page.keywords.len() > KEYWORDS_MAX {
        warnings.push(format!("Too many keywords (>{KEYWORDS_MAX})"));
    }

    if !page.canonical_url.is_empty() && Url::parse(&page.canonical_url).is_err() {
        errors.push("Invalid canonical URL format".to_string());
    }

    SeoAudit {
        is_valid: errors.is_empty(),
        warnings,
        errors,
    }
}

/// Occurrences of one keyword in a body of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeywordDensity {
    pub count: usize,
    /// Percentage of all words.
    pub density: f64,
}

/// Count, per keyword, the words that contain it or are contained in it.
/// Punctuation around words is ignored.
pub fn keyword_density(content: &str, keywords: &[String]) -> BTreeMap<String, KeywordDensity> {
    let words: Vec<String> = content
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();
    let total = words.len();

    keywords
        .iter()
        .map(|keyword| {
            let needle = keyword.to_lowercase();
            let count = words
                .iter()
                .filter(|w| w.contains(&needle) || needle.contains(w.as_str()))
                .count();
            let density = if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            (keyword.clone(), KeywordDensity { count, density })
        })
        .collect()
}

/// Extend `base` with related industry keywords, dropping duplicates and
/// capping the list at [`KEYWORDS_MAX`].
pub fn optimize_keywords(base: &[String]) -> Vec<String> {
    let lowered: Vec<String> = base.iter().map(|b| b.to_lowercase()).collect();
    let related = PRIMARY_KEYWORDS
        .iter()
        .chain(SECONDARY_KEYWORDS)
        .chain(LOCAL_KEYWORDS)
        .filter(|k| {
            lowered
                .iter()
                .any(|b| k.contains(b.as_str()) || b.contains(*k))
        })
        .map(|k| (*k).to_string());

    let mut out: Vec<String> = Vec::new();
    for keyword in base.iter().cloned().chain(related) {
        if !out.contains(&keyword) {
            out.push(keyword);
        }
        if out.len() == KEYWORDS_MAX {
            break;
        }
    }
    out
}
