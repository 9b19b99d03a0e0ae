//! LinkedIn profile URL validation and canonicalization.

use once_cell::sync::Lazy;
use regex::Regex;

static PROFILE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(www\.)?linkedin\.com/in/([A-Za-z0-9\-_%.]+)/?(\?.*)?$")
        .expect("profile URL regex")
});

pub fn is_valid_profile_url(url: &str) -> bool {
    PROFILE_URL.is_match(url.trim())
}

/// Extract the canonical handle from any accepted spelling of a profile URL.
/// Trailing slashes and query strings are discarded; anything not matching
/// the `/in/<handle>` pattern is rejected.
pub fn canonical_handle(url: &str) -> Option<String> {
    PROFILE_URL
        .captures(url.trim())
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Normalize to the single canonical URL spelling stored on records.
pub fn normalize_profile_url(url: &str) -> Option<String> {
    canonical_handle(url).map(|handle| format!("https://www.linkedin.com/in/{}", handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalent_spellings_share_one_canonical_handle() {
        let spellings = [
            "https://www.linkedin.com/in/jane-doe",
            "https://www.linkedin.com/in/jane-doe/",
            "https://linkedin.com/in/jane-doe",
            "http://www.linkedin.com/in/jane-doe?utm_source=share",
            "https://www.linkedin.com/in/jane-doe/?originalSubdomain=de",
        ];
        for spelling in spellings {
            assert_eq!(
                canonical_handle(spelling).as_deref(),
                Some("jane-doe"),
                "failed for {}",
                spelling
            );
        }
    }

    #[test]
    fn non_profile_paths_are_rejected() {
        for bad in [
            "https://www.linkedin.com/company/acme",
            "https://www.linkedin.com/in/",
            "https://example.com/in/jane-doe",
            "jane-doe",
            "",
        ] {
            assert_eq!(canonical_handle(bad), None, "accepted {}", bad);
        }
    }

    #[test]
    fn normalize_produces_stable_url() {
        assert_eq!(
            normalize_profile_url("http://linkedin.com/in/j%C3%B8rgen_99/?ref=x").as_deref(),
            Some("https://www.linkedin.com/in/j%C3%B8rgen_99")
        );
    }
}
