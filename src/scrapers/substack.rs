//! Substack post scraper.
//!
//! Discovers posts through the publication's RSS feed (`{base_url}/feed`)
//! and mirrors each one as a markdown file plus the raw post HTML. The
//! markdown carries the markers the metadata extractor looks for: the
//! title as an `#` heading, the subtitle as `###`, the date bolded, and a
//! `**Likes:**` line.

use crate::models::ScrapedPost;
use crate::utils::{slugify_title, truncate_for_log};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::get;
use scraper::{Html, Selector};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Index the publication feed to extract post URLs.
///
/// Fetches `{base_url}/feed` and collects every `<item><link>` in feed
/// order (newest first). `max_posts == 0` means unbounded.
#[instrument(level = "info", skip_all, fields(%base_url, max_posts))]
pub async fn index_posts(base_url: &str, max_posts: usize) -> Result<Vec<String>, Box<dyn Error>> {
    let feed_url = Url::parse(base_url)?.join("feed")?;
    let xml = get(feed_url.clone()).await?.text().await?;

    let mut urls = parse_feed_links(&xml)?;
    if max_posts > 0 {
        urls.truncate(max_posts);
    }

    info!(count = urls.len(), feed = %feed_url, "Indexed post URLs");
    debug!(?urls, "Post URLs");
    Ok(urls)
}

/// Pull `<item><link>` values out of an RSS feed document.
fn parse_feed_links(xml: &str) -> Result<Vec<String>, Box<dyn Error>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut urls = Vec::new();
    let mut in_item = false;
    let mut in_link = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"item" => in_item = true,
                b"link" if in_item => in_link = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"item" => in_item = false,
                b"link" => in_link = false,
                _ => {}
            },
            Event::Text(t) if in_link => {
                let url = t.xml_content()?.trim().to_string();
                if !url.is_empty() {
                    urls.push(url);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(urls)
}

/// Fetch posts and write one markdown and one HTML file per post.
///
/// Files are named by the post's URL slug. Failed fetches are logged and
/// skipped without failing the batch. Returns the paths of the markdown
/// files written.
#[instrument(level = "info", skip_all, fields(count = urls.len()))]
pub async fn fetch_posts(urls: Vec<String>, md_dir: &Path, html_dir: &Path) -> Vec<PathBuf> {
    let mut written = Vec::new();

    for url in urls {
        let post = match fetch_post(&url).await {
            Ok(post) => post,
            Err(e) => {
                error!(error = %e, %url, "Post fetch failed; skipping");
                continue;
            }
        };

        let md_path = md_dir.join(format!("{}.md", post.slug));
        let html_path = html_dir.join(format!("{}.html", post.slug));

        if let Err(e) = tokio::fs::write(&md_path, &post.markdown).await {
            error!(path = %md_path.display(), error = %e, "Failed writing markdown; skipping post");
            continue;
        }
        if let Err(e) = tokio::fs::write(&html_path, &post.html).await {
            warn!(path = %html_path.display(), error = %e, "Failed writing HTML mirror");
        }

        debug!(%url, slug = %post.slug, "Scraped post");
        written.push(md_path);
    }

    info!(count = written.len(), "Scraped posts to disk");
    written
}

/// Fetch and render a single post.
#[instrument(level = "info", skip_all, fields(%url))]
async fn fetch_post(url: &str) -> Result<ScrapedPost, Box<dyn Error>> {
    let html = get(url).await?.text().await?;
    let document = Html::parse_document(&html);

    let title_selector = Selector::parse("h1.post-title")?;
    let subtitle_selector = Selector::parse("h3.subtitle")?;
    let date_selector = Selector::parse("time")?;
    let likes_selector = Selector::parse(".like-button-container .label")?;
    let body_selector = Selector::parse("div.available-content p")?;

    let title = element_text(&document, &title_selector).unwrap_or_default();
    let subtitle = element_text(&document, &subtitle_selector);
    let date = element_text(&document, &date_selector);
    let likes = element_text(&document, &likes_selector)
        .map(|t| t.chars().filter(|c| c.is_ascii_digit()).collect::<String>())
        .filter(|t| !t.is_empty());

    let paragraphs: Vec<String> = document
        .select(&body_selector)
        .map(|p| p.text().collect::<Vec<_>>().join(""))
        .filter(|t| !t.trim().is_empty())
        .collect();

    let slug = slug_from_url(url).unwrap_or_else(|| slugify_title(&title));
    let markdown = render_markdown(
        &title,
        subtitle.as_deref(),
        date.as_deref(),
        likes.as_deref(),
        &paragraphs,
    );

    info!(
        bytes = markdown.len(),
        preview = %truncate_for_log(&markdown, 120),
        "Rendered post markdown"
    );
    Ok(ScrapedPost {
        slug,
        markdown,
        html,
    })
}

/// First matching element's text, trimmed, if non-empty.
fn element_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|e| e.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Last non-empty path segment of a post URL, e.g.
/// `https://example.substack.com/p/my-post` -> `my-post`.
fn slug_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}

/// Render a post to the mirror's markdown shape.
///
/// The emitted markers must stay in sync with what the metadata extractor
/// scans for.
fn render_markdown(
    title: &str,
    subtitle: Option<&str>,
    date: Option<&str>,
    likes: Option<&str>,
    paragraphs: &[String],
) -> String {
    let mut md = String::new();
    md.push_str(&format!("# {}\n\n", title));
    if let Some(subtitle) = subtitle {
        md.push_str(&format!("### {}\n\n", subtitle));
    }
    if let Some(date) = date {
        md.push_str(&format!("**{}**\n\n", date));
    }
    md.push_str(&format!("**Likes:** {}\n\n", likes.unwrap_or("0")));
    for paragraph in paragraphs {
        md.push_str(paragraph.trim());
        md.push_str("\n\n");
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_metadata;

    #[test]
    fn test_parse_feed_links() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>A Newsletter</title>
    <link>https://example.substack.com</link>
    <item>
      <title>First Post</title>
      <link>https://example.substack.com/p/first-post</link>
    </item>
    <item>
      <title>Second Post</title>
      <link>https://example.substack.com/p/second-post</link>
    </item>
  </channel>
</rss>"#;

        let urls = parse_feed_links(xml).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://example.substack.com/p/first-post",
                "https://example.substack.com/p/second-post",
            ]
        );
    }

    #[test]
    fn test_parse_feed_links_ignores_channel_link() {
        let xml = "<rss><channel><link>https://example.com</link></channel></rss>";
        let urls = parse_feed_links(xml).unwrap();
        assert!(urls.is_empty());
    }

    #[test]
    fn test_slug_from_url() {
        assert_eq!(
            slug_from_url("https://example.substack.com/p/my-post"),
            Some("my-post".to_string())
        );
        assert_eq!(
            slug_from_url("https://example.substack.com/p/my-post/"),
            Some("my-post".to_string())
        );
        assert_eq!(slug_from_url("https://example.substack.com/"), None);
    }

    #[test]
    fn test_render_markdown_round_trips_through_extractor() {
        let md = render_markdown(
            "Friends and Trees",
            Some("On roots"),
            Some("May 10, 2025"),
            Some("23"),
            &["First paragraph.".to_string(), "Second.".to_string()],
        );

        let record = extract_metadata(&md, "friends-and-trees.md");
        assert_eq!(record.title, "Friends and Trees");
        assert_eq!(record.subtitle, "On roots");
        assert_eq!(record.date, "May 10, 2025");
        assert_eq!(record.like_count, "23");
    }

    #[test]
    fn test_render_markdown_minimal_post() {
        let md = render_markdown("Bare", None, None, None, &[]);
        let record = extract_metadata(&md, "bare.md");
        assert_eq!(record.title, "Bare");
        assert_eq!(record.subtitle, "");
        assert_eq!(record.date, "Date not found");
        assert_eq!(record.like_count, "0");
    }
}
