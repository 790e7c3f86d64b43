//! Invocation handlers.
//!
//! Each scheduled trigger runs exactly one handler to completion. Two
//! variants exist:
//!
//! - [`run_smoke`]: writes a single timestamped placeholder object. No
//!   scraping, no indexing; exists to verify the trigger-to-bucket path.
//! - [`run_full`]: scrape -> upload markdown -> rebuild the whole index ->
//!   upload static-site assets -> summary.
//!
//! The full handler is the crate's single catch-all error boundary: any
//! failure that propagates out of a pipeline stage is logged and converted
//! into a 500 [`HandlerResponse`]. The process never crashes uncontrolled.

use crate::indexer::{self, ESSAYS_DATA_KEY};
use crate::models::{HandlerResponse, RunSummary};
use crate::scrapers::substack;
use crate::storage::Bucket;
use crate::uploader;
use chrono::Local;
use std::error::Error;
use std::path::PathBuf;
use tracing::{error, info, instrument, warn};

/// Settings for one full pipeline run.
#[derive(Debug)]
pub struct FullRunConfig {
    /// Publication base URL, e.g. `https://example.substack.com/`.
    pub site_url: String,
    /// Maximum posts to scrape; 0 means unbounded.
    pub max_posts: usize,
    /// Key prefix scraped markdown is uploaded under, e.g. `posts/`.
    pub posts_prefix: String,
    /// Local static-site tree to push to the bucket root, if any.
    pub static_dir: Option<PathBuf>,
    /// Emit derived `.html` links in essay records (legacy site variant).
    pub html_links: bool,
    /// Legacy bucket to seed `essays-data.json` from, if any.
    pub legacy_bucket: Option<String>,
}

/// Write a single timestamped placeholder object.
///
/// Demonstration-only smoke test of the invocation path; reproduces the
/// original backup placeholder behavior.
#[instrument(level = "info", skip_all, fields(bucket = %bucket.name()))]
pub async fn run_smoke(bucket: &Bucket) -> HandlerResponse {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let key = format!("backup_{timestamp}.txt");
    let body = format!("Substack backup created at {timestamp}");

    match bucket.put_bytes(&key, body.into_bytes(), "text/plain").await {
        Ok(()) => {
            info!(%key, "Wrote placeholder object");
            HandlerResponse::ok(format!("File uploaded to {}", bucket.name()))
        }
        Err(e) => {
            error!(error = %e, "Smoke handler failed");
            HandlerResponse::error(e)
        }
    }
}

/// Run the full pipeline: scrape, upload, reindex, push static assets.
///
/// All failures that are not recoverable per-item surface here and become
/// a 500 response carrying the error message.
#[instrument(level = "info", skip_all, fields(bucket = %bucket.name(), site = %config.site_url))]
pub async fn run_full(bucket: &Bucket, config: &FullRunConfig) -> HandlerResponse {
    match full_run(bucket, config).await {
        Ok(summary) => {
            info!(
                unique_articles = summary.unique_articles,
                duplicates_skipped = summary.duplicates_skipped,
                files_uploaded = summary.files_uploaded,
                "Pipeline run completed"
            );
            match serde_json::to_string(&summary) {
                Ok(body) => HandlerResponse::ok(body),
                Err(e) => HandlerResponse::error(e),
            }
        }
        Err(e) => {
            error!(error = %e, error_debug = ?e, "Pipeline run failed");
            HandlerResponse::error(e)
        }
    }
}

async fn full_run(
    bucket: &Bucket,
    config: &FullRunConfig,
) -> Result<RunSummary, Box<dyn Error>> {
    if let Some(ref legacy) = config.legacy_bucket {
        seed_from_legacy(bucket, legacy).await;
    }

    // Fresh scratch space per invocation; removed on drop.
    let scratch = tempfile::tempdir()?;
    let md_dir = scratch.path().join("markdown");
    let html_dir = scratch.path().join("html");
    tokio::fs::create_dir_all(&md_dir).await?;
    tokio::fs::create_dir_all(&html_dir).await?;

    // A scrape failure degrades the run to reindexing existing content.
    let scraped = match substack::index_posts(&config.site_url, config.max_posts).await {
        Ok(urls) => substack::fetch_posts(urls, &md_dir, &html_dir).await,
        Err(e) => {
            warn!(error = %e, "Scrape failed; reindexing existing content only");
            Vec::new()
        }
    };
    info!(count = scraped.len(), "Scraped new posts");

    // Only the markdown mirrors are published; the HTML output stays local.
    let prefix = normalized_prefix(&config.posts_prefix);
    let scraped_report = uploader::upload_tree(bucket, &md_dir, prefix.as_deref()).await?;

    let outcome = indexer::run_index(bucket, prefix.as_deref(), true, config.html_links).await?;

    let mut files_uploaded = scraped_report.uploaded.len();
    if let Some(ref static_dir) = config.static_dir {
        let static_report = uploader::upload_tree(bucket, static_dir, None).await?;
        files_uploaded += static_report.uploaded.len();
    }

    Ok(RunSummary {
        unique_articles: outcome.essays.len(),
        duplicates_skipped: outcome.duplicates_skipped,
        files_uploaded,
    })
}

/// Copy `essays-data.json` from the legacy bucket into the target bucket.
///
/// Best-effort bootstrap: the artifact is fully rebuilt later in the run,
/// but seeding first means the site keeps serving data even if this run
/// finds an empty corpus. Failures are logged and ignored.
async fn seed_from_legacy(bucket: &Bucket, legacy_name: &str) {
    let legacy = bucket.sibling(legacy_name);
    match legacy.get_text(ESSAYS_DATA_KEY).await {
        Ok(body) => {
            if let Err(e) = bucket
                .put_bytes(ESSAYS_DATA_KEY, body.into_bytes(), "application/json")
                .await
            {
                warn!(error = %e, "Failed writing seeded essays data; continuing");
            } else {
                info!(legacy_bucket = legacy_name, "Seeded essays data from legacy bucket");
            }
        }
        Err(e) => {
            warn!(legacy_bucket = legacy_name, error = %e, "No legacy essays data; continuing");
        }
    }
}

/// Treat an empty or whitespace prefix as "no prefix" and make sure a
/// present one ends with `/`, so keys never concatenate into
/// `postsmy-post.md`.
fn normalized_prefix(prefix: &str) -> Option<String> {
    let trimmed = prefix.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.ends_with('/') {
        Some(trimmed.to_string())
    } else {
        Some(format!("{trimmed}/"))
    }
}
