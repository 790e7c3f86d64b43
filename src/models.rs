//! Data models for mirrored essays and handler results.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`EssayRecord`]: metadata recovered from one mirrored markdown file
//! - [`ScrapedPost`]: a freshly scraped post before it is written to disk
//! - [`RunSummary`]: outcome counts for one full pipeline run
//! - [`HandlerResponse`]: the status/body pair returned by every handler
//!
//! The JSON field names (`like_count`, `file_link`, `html_link`) match the
//! schema consumed by the static site's `populate-essays.js`, so they must
//! not be renamed.

use serde::{Deserialize, Serialize};

/// Metadata for a single mirrored essay.
///
/// One record is produced per markdown object during an indexing run. All
/// fields are strings because the upstream markdown is only semi-structured;
/// missing fields carry documented defaults instead of being absent:
///
/// - `date` defaults to `"Date not found"`
/// - `like_count` defaults to `"0"`
/// - `subtitle` defaults to the empty string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EssayRecord {
    /// Essay title, from the first `#`/`##` heading or the filename.
    pub title: String,
    /// Subtitle from the first `###` heading, empty if absent.
    pub subtitle: String,
    /// Like count as scraped, digits only.
    pub like_count: String,
    /// Free-text publication date, e.g. `"May 10, 2025"`.
    pub date: String,
    /// Object-storage key of the source markdown file.
    pub file_link: String,
    /// Derived `.html` key, only emitted in legacy-link mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
}

/// A post scraped from the newsletter site, ready to be rendered to disk.
#[derive(Debug)]
pub struct ScrapedPost {
    /// URL slug, used as the output file stem.
    pub slug: String,
    /// Rendered markdown mirror of the post.
    pub markdown: String,
    /// Raw post HTML as fetched.
    pub html: String,
}

/// Outcome counts for one full pipeline run.
#[derive(Debug, Deserialize, Serialize)]
pub struct RunSummary {
    /// Essays surviving title dedup, i.e. records in `essays-data.json`.
    pub unique_articles: usize,
    /// Records dropped because their normalized title was already seen.
    pub duplicates_skipped: usize,
    /// Files successfully pushed to the bucket this run (scraped + static).
    pub files_uploaded: usize,
}

/// Status/body pair returned by every handler variant.
///
/// Mirrors the deployment's invocation contract: 200 with a summary body on
/// success, 500 with the error message otherwise. Handlers never panic or
/// propagate errors past this type.
#[derive(Debug, Deserialize, Serialize)]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    /// A 200 response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into(),
        }
    }

    /// A 500 response carrying a JSON-encoded error message.
    pub fn error(message: impl std::fmt::Display) -> Self {
        let body = serde_json::json!({
            "error": message.to_string(),
            "message": "Pipeline run failed",
        });
        Self {
            status_code: 500,
            body: body.to_string(),
        }
    }

    /// True for 2xx responses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
