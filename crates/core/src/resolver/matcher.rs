//! Fuzzy title matching.
//!
//! Decides whether a title found on a results page is the book that was
//! asked for. Pure and deterministic.

use crate::config::MatcherConfig;

/// Decorative markers search pages attach to titles.
const DECORATIVE_MARKERS: &[&str] = &["[书籍]", "(豆瓣)", "（豆瓣）"];

/// Title matcher with a configurable containment threshold.
#[derive(Debug, Clone)]
pub struct TitleMatcher {
    min_containment_ratio: f64,
}

impl Default for TitleMatcher {
    fn default() -> Self {
        Self::with_config(&MatcherConfig::default())
    }
}

impl TitleMatcher {
    pub fn new(min_containment_ratio: f64) -> Self {
        Self {
            min_containment_ratio,
        }
    }

    pub fn with_config(config: &MatcherConfig) -> Self {
        Self::new(config.min_containment_ratio)
    }

    /// Whether `found_title` should be accepted for `search_title`.
    ///
    /// Both titles are normalized first. Equal titles match; otherwise one
    /// must contain the other and the shorter must be at least
    /// `min_containment_ratio` of the longer, measured in characters.
    pub fn is_match(&self, search_title: &str, found_title: &str) -> bool {
        let search = normalize_title(search_title);
        let found = normalize_title(found_title);

        if search.is_empty() || found.is_empty() {
            return false;
        }

        if search == found {
            return true;
        }

        if search.contains(found.as_str()) || found.contains(search.as_str()) {
            return containment_ratio(&search, &found) >= self.min_containment_ratio;
        }

        false
    }

    /// Loose check used to shortlist links before full matching.
    pub fn loosely_contains(&self, text: &str, title: &str) -> bool {
        let text = normalize_title(text);
        let title = normalize_title(title);
        if text.is_empty() || title.is_empty() {
            return false;
        }
        text.contains(title.as_str()) || title.contains(text.as_str())
    }
}

/// Trim, lowercase, drop decorative markers and collapse whitespace.
pub fn normalize_title(title: &str) -> String {
    let mut normalized = title.trim().to_lowercase();
    for marker in DECORATIVE_MARKERS {
        normalized = normalized.replace(marker, " ");
    }
    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `len(shorter) / len(longer)` in characters.
pub fn containment_ratio(a: &str, b: &str) -> f64 {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    let (shorter, longer) = if a_len <= b_len {
        (a_len, b_len)
    } else {
        (b_len, a_len)
    };
    if longer == 0 {
        return 0.0;
    }
    shorter as f64 / longer as f64
}
