//! Utility functions for title normalization, slugs, and log formatting.

/// Normalize a title for deduplication.
///
/// Lowercased and trimmed. Two essays whose titles agree under this
/// normalization are treated as the same essay corpus-wide, and only the
/// first one seen survives an indexing run.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_title("  Hello World "), "hello world");
/// ```
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Convert a title to a URL-friendly slug.
///
/// Lowercases the text, removes special characters, and replaces spaces
/// with hyphens. Used to name scraped post files when the post URL has no
/// usable path segment.
pub fn slugify_title(title: &str) -> String {
    title
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-', "")
        .replace(' ', "-")
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes with an ellipsis and
/// byte count indicator appended. The cut is backed off to the nearest
/// char boundary so multibyte content (curly quotes, CJK) never panics
/// the slice.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Hello World"), "hello world");
        assert_eq!(normalize_title("  hello "), "hello");
        assert_eq!(normalize_title("HELLO"), "hello");
    }

    #[test]
    fn test_normalize_title_agrees_modulo_case_and_whitespace() {
        assert_eq!(normalize_title("Hello"), normalize_title("hello "));
    }

    #[test]
    fn test_slugify_title() {
        assert_eq!(slugify_title("Hello World"), "hello-world");
        assert_eq!(slugify_title("Friends, Trees & Fascism!"), "friends-trees--fascism");
        assert_eq!(slugify_title("Already-Hyphenated"), "already-hyphenated");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_backs_off_to_char_boundary() {
        // 120 bytes lands mid-character for 3-byte CJK content shifted by
        // the two-byte "# " prefix; the cut must not panic.
        let s = format!("# {}", "日".repeat(60));
        let result = truncate_for_log(&s, 120);
        assert!(result.contains("bytes)"));
        assert!(result.starts_with("# 日"));

        // Curly quotes straddling the budget behave the same.
        let s = format!("{}\u{2019}tis", "a".repeat(119));
        let result = truncate_for_log(&s, 120);
        assert!(result.starts_with(&"a".repeat(119)));
        assert!(result.contains("bytes)"));
    }
}
