//! Best-effort mapping of free-text profile locations to coarse country labels.
//!
//! This is keyword matching, not geocoding: ambiguous city names that exist in more
//! than one country will misclassify, and that is an accepted limitation.

/// Ordered country/keyword table. Earlier entries win ties, so the order must be
/// preserved exactly.
const COUNTRY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Canada", &["Canada", "Toronto", "Montreal", "Vancouver", "Ottawa", "Calgary"]),
    (
        "United States",
        &["USA", "United States", "US", "New York", "California", "Texas", "Seattle", "Boston"],
    ),
    ("United Kingdom", &["UK", "United Kingdom", "London", "England", "Scotland", "Wales"]),
    ("Germany", &["Germany", "Berlin", "Munich", "Hamburg"]),
    ("France", &["France", "Paris", "Lyon"]),
    ("China", &["China", "Beijing", "Shanghai", "Shenzhen"]),
    ("India", &["India", "Bangalore", "Mumbai", "Delhi", "Hyderabad"]),
    ("Australia", &["Australia", "Sydney", "Melbourne"]),
    ("Japan", &["Japan", "Tokyo", "Osaka"]),
    ("Brazil", &["Brazil", "São Paulo", "Rio de Janeiro"]),
    ("Netherlands", &["Netherlands", "Amsterdam"]),
    ("Switzerland", &["Switzerland", "Zurich", "Geneva"]),
    ("Singapore", &["Singapore"]),
];

/// Returned when a non-empty location matches no keyword.
pub const OTHER: &str = "Other";

/// Classify a profile location string into a coarse country label.
///
/// Matching is a case-insensitive substring test against the keyword table; the first
/// matching country in table order wins. A non-empty location with no match yields
/// [`OTHER`]. An absent or empty location yields `None`, which is distinct from
/// [`OTHER`]: the former means "unknown", the latter "known but unrecognized".
#[must_use]
pub fn classify(location: Option<&str>) -> Option<&'static str> {
    let location = location?.trim();
    if location.is_empty() {
        return None;
    }

    let lowered = location.to_lowercase();
    for (country, keywords) in COUNTRY_KEYWORDS {
        if keywords.iter().any(|keyword| lowered.contains(&keyword.to_lowercase())) {
            return Some(country);
        }
    }

    Some(OTHER)
}
