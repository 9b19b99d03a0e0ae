//! Common utility functions used across the codebase.

/// Truncates a string to at most `max_chars` characters, adding "..." if
/// truncated. UTF-8 safe: respects character boundaries rather than bytes.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    // Fast path: byte length <= max_chars implies char count is too.
    if s.len() <= max_chars {
        return s.to_string();
    }
    let char_count = s.chars().count();
    if char_count <= max_chars {
        return s.to_string();
    }
    let suffix = "...";
    let suffix_len = suffix.chars().count();
    if max_chars <= suffix_len {
        return suffix.chars().take(max_chars).collect();
    }
    let keep = max_chars - suffix_len;
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(suffix);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_pass_through() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn long_strings_get_ellipsis() {
        assert_eq!(truncate_str("hello world", 8), "hello...");
    }

    #[test]
    fn multibyte_safe() {
        assert_eq!(truncate_str("🦀🦀🦀🦀🦀", 4), "🦀...");
    }
}
