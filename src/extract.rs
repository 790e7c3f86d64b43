//! Heuristic metadata extraction from mirrored markdown.
//!
//! Scraped posts are only semi-structured: a heading, an optional subtitle
//! heading, a bolded date line, and a `**Likes:**` marker, in no guaranteed
//! order. This module recovers `{title, subtitle, date, like_count}` by
//! first-match-wins line scanning over bounded windows at the top of the
//! file.
//!
//! The extractor is a pure function over `(content, filename)` and never
//! fails: every field falls back to its documented default instead of
//! raising. All searches are independent of each other and order-sensitive
//! within their window (first match in line order, not best match).

use crate::models::EssayRecord;
use once_cell::sync::Lazy;
use regex::Regex;

/// Lines scanned for the title heading.
const TITLE_WINDOW: usize = 10;
/// Lines scanned for the subtitle heading.
const SUBTITLE_WINDOW: usize = 20;
/// Lines scanned for the date and like-count markers.
const DATE_WINDOW: usize = 30;

/// Default date when no pattern matches.
pub const DATE_NOT_FOUND: &str = "Date not found";

/// First `**...**` delimited span on a line, e.g. `**May 10, 2025**`.
static BOLD_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

/// Any 4-digit run, used to qualify bolded lines as date candidates.
static YEAR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());

/// Fallback date shapes, tried in order per line: "Mon D, YYYY",
/// "D/D/YYYY", "YYYY-MM-DD".
static DATE_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"\w{3}\s+\d{1,2},\s+\d{4}").unwrap(),
        Regex::new(r"\d{1,2}/\d{1,2}/\d{4}").unwrap(),
        Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap(),
    ]
});

/// `**Likes:** <digits>` marker.
static LIKES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*Likes:\*\*\s*(\d+)").unwrap());

/// Extract essay metadata from raw markdown content.
///
/// The returned record has every field populated with either an extracted
/// value or its default; `file_link` and `html_link` are left for the
/// caller (the indexer) to attach.
///
/// # Field rules
///
/// - **title**: first line in the first 10 starting with `"# "` or `"## "`,
///   marker stripped and trimmed; otherwise derived from the filename.
/// - **subtitle**: first line in the first 20 starting with `"### "`;
///   empty if absent.
/// - **date**: pass 1 scans the first 30 lines for a line starting with
///   `**` that contains a 4-digit run and takes the first `**...**` span;
///   pass 2 (only if pass 1 found nothing) retries the same window against
///   three ordered regex patterns. Defaults to [`DATE_NOT_FOUND`].
/// - **like_count**: digits following `**Likes:**` in the first 30 lines;
///   `"0"` default.
pub fn extract_metadata(content: &str, filename: &str) -> EssayRecord {
    let lines: Vec<&str> = content.lines().collect();

    let mut title = String::new();
    for line in lines.iter().take(TITLE_WINDOW) {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("# ") {
            title = rest.trim().to_string();
            break;
        } else if let Some(rest) = line.strip_prefix("## ") {
            title = rest.trim().to_string();
            break;
        }
    }
    if title.is_empty() {
        title = title_from_filename(filename);
    }

    let mut subtitle = String::new();
    for line in lines.iter().take(SUBTITLE_WINDOW) {
        if let Some(rest) = line.trim().strip_prefix("### ") {
            subtitle = rest.trim().to_string();
            break;
        }
    }

    let mut date = String::new();
    for line in lines.iter().take(DATE_WINDOW) {
        let line = line.trim();
        if line.starts_with("**") && YEAR_RUN.is_match(line) {
            if let Some(caps) = BOLD_SPAN.captures(line) {
                date = caps[1].trim().to_string();
                break;
            }
        }
    }
    if date.is_empty() {
        'outer: for line in lines.iter().take(DATE_WINDOW) {
            for pattern in DATE_PATTERNS.iter() {
                if let Some(m) = pattern.find(line) {
                    date = m.as_str().to_string();
                    break 'outer;
                }
            }
        }
    }
    if date.is_empty() {
        date = DATE_NOT_FOUND.to_string();
    }

    let mut like_count = "0".to_string();
    for line in lines.iter().take(DATE_WINDOW) {
        if let Some(caps) = LIKES.captures(line) {
            like_count = caps[1].to_string();
            break;
        }
    }

    EssayRecord {
        title,
        subtitle,
        like_count,
        date,
        file_link: String::new(),
        html_link: None,
    }
}

/// Derive a display title from a markdown filename.
///
/// Strips the `.md` suffix, replaces hyphens with spaces, and uppercases
/// the first letter of every word: `"my-first-post.md"` -> `"My First Post"`.
pub fn title_from_filename(filename: &str) -> String {
    let stem = filename.strip_suffix(".md").unwrap_or(filename);
    let spaced = stem.replace('-', " ");

    let mut out = String::with_capacity(spaced.len());
    let mut at_word_start = true;
    for c in spaced.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !(c.is_alphanumeric() || c == '_');
    }
    out
}

/// Synthesize a minimal record from a filename alone.
///
/// Used when a markdown object cannot be downloaded or decoded: the run
/// still includes the essay, with every content-derived field at its
/// default.
pub fn fallback_record(filename: &str) -> EssayRecord {
    EssayRecord {
        title: title_from_filename(filename),
        subtitle: String::new(),
        like_count: "0".to_string(),
        date: DATE_NOT_FOUND.to_string(),
        file_link: String::new(),
        html_link: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_from_h1() {
        let record = extract_metadata("# Hello World\nbody", "ignored.md");
        assert_eq!(record.title, "Hello World");
    }

    #[test]
    fn test_title_from_h2() {
        let record = extract_metadata("intro\n## Second Level\nbody", "ignored.md");
        assert_eq!(record.title, "Second Level");
    }

    #[test]
    fn test_title_first_match_wins() {
        let record = extract_metadata("# First\n## Second", "ignored.md");
        assert_eq!(record.title, "First");
    }

    #[test]
    fn test_title_outside_window_falls_back_to_filename() {
        let content = format!("{}# Too Late", "\n".repeat(10));
        let record = extract_metadata(&content, "my-first-post.md");
        assert_eq!(record.title, "My First Post");
    }

    #[test]
    fn test_title_from_filename() {
        assert_eq!(title_from_filename("my-first-post.md"), "My First Post");
        assert_eq!(title_from_filename("single.md"), "Single");
        assert_eq!(title_from_filename("no-extension"), "No Extension");
    }

    #[test]
    fn test_subtitle_extraction() {
        let record = extract_metadata("# Title\n\n### A Subtitle Here\nbody", "f.md");
        assert_eq!(record.subtitle, "A Subtitle Here");
    }

    #[test]
    fn test_subtitle_absent_is_empty() {
        let record = extract_metadata("# Title\nbody only", "f.md");
        assert_eq!(record.subtitle, "");
    }

    #[test]
    fn test_date_from_bold_span() {
        let record = extract_metadata("# T\n\n**May 10, 2025**\n", "f.md");
        assert_eq!(record.date, "May 10, 2025");
    }

    #[test]
    fn test_bold_line_without_year_is_skipped() {
        // A bolded line with no 4-digit run must not satisfy pass 1; the
        // date is then picked up by the pattern pass on a later line.
        let content = "# T\n**bold but dateless**\nPublished Jan 5, 2024\n";
        let record = extract_metadata(content, "f.md");
        assert_eq!(record.date, "Jan 5, 2024");
    }

    #[test]
    fn test_date_pattern_slash_format() {
        let record = extract_metadata("# T\nposted 5/10/2025 online", "f.md");
        assert_eq!(record.date, "5/10/2025");
    }

    #[test]
    fn test_date_pattern_iso_format() {
        let record = extract_metadata("# T\nupdated: 2025-05-10", "f.md");
        assert_eq!(record.date, "2025-05-10");
    }

    #[test]
    fn test_date_default() {
        let record = extract_metadata("# T\nno dates here", "f.md");
        assert_eq!(record.date, DATE_NOT_FOUND);
    }

    #[test]
    fn test_like_count() {
        let record = extract_metadata("# T\n**Likes:** 17\n", "f.md");
        assert_eq!(record.like_count, "17");
    }

    #[test]
    fn test_like_count_default() {
        let record = extract_metadata("# T\n", "f.md");
        assert_eq!(record.like_count, "0");
    }

    #[test]
    fn test_all_fields_populated_on_empty_input() {
        let record = extract_metadata("", "some-essay.md");
        assert_eq!(record.title, "Some Essay");
        assert_eq!(record.subtitle, "");
        assert_eq!(record.date, DATE_NOT_FOUND);
        assert_eq!(record.like_count, "0");
    }

    #[test]
    fn test_fallback_record() {
        let record = fallback_record("lost-essay.md");
        assert_eq!(record.title, "Lost Essay");
        assert_eq!(record.subtitle, "");
        assert_eq!(record.date, DATE_NOT_FOUND);
        assert_eq!(record.like_count, "0");
        assert_eq!(record.file_link, "");
    }

    #[test]
    fn test_full_post_shape() {
        let content = "\
# Friends and Trees and Fascism

### On neighbors, roots, and what holds

**May 10, 2025**

**Likes:** 23

The essay body begins here.
";
        let record = extract_metadata(content, "friends-and-trees-and-fascism.md");
        assert_eq!(record.title, "Friends and Trees and Fascism");
        assert_eq!(record.subtitle, "On neighbors, roots, and what holds");
        assert_eq!(record.date, "May 10, 2025");
        assert_eq!(record.like_count, "23");
    }
}
