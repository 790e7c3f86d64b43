//! Index rebuilding over the mirror bucket.
//!
//! One indexing run lists every markdown object, downloads and extracts
//! each, deduplicates by object key and by normalized title, sorts by
//! parsed date (newest first), and republishes two JSON artifacts:
//!
//! - `essays-data.json`: the full ordered [`EssayRecord`] list
//! - `file-list.json`: lexicographically sorted bare filenames of every
//!   processed markdown object (pre-title-dedup)
//!
//! Both artifacts are rebuilt from scratch and fully overwritten each run;
//! nothing is patched incrementally. The core of the run is the pure
//! [`build_index`] function so the dedup/sort/fallback rules are testable
//! without any storage.

use crate::extract::{extract_metadata, fallback_record};
use crate::models::EssayRecord;
use crate::storage::Bucket;
use crate::utils::normalize_title;
use chrono::NaiveDate;
use futures::{pin_mut, StreamExt};
use itertools::Itertools;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::error::Error;
use tracing::{info, instrument, warn};

/// Object key for the full metadata artifact.
pub const ESSAYS_DATA_KEY: &str = "essays-data.json";
/// Object key for the filename-list artifact.
pub const FILE_LIST_KEY: &str = "file-list.json";

/// Date format the sort key is parsed against, e.g. `"May 10, 2025"`.
const SORT_DATE_FORMAT: &str = "%b %d, %Y";

/// Result of one indexing run, before the artifacts are written.
#[derive(Debug, PartialEq, Eq)]
pub struct IndexOutcome {
    /// Accepted records, sorted by parsed date descending.
    pub essays: Vec<EssayRecord>,
    /// Bare filenames of every processed object, sorted lexicographically.
    /// Includes files later dropped by title dedup.
    pub file_names: Vec<String>,
    /// Records dropped because their normalized title was already seen.
    pub duplicates_skipped: usize,
}

/// Parse an extracted date string into a sort key.
///
/// Any parse failure, including the literal `"Date not found"`, maps to the
/// minimum date so the record sinks to the end of a newest-first ordering.
pub fn parse_sort_date(date: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date.trim(), SORT_DATE_FORMAT).unwrap_or(NaiveDate::MIN)
}

/// Bare filename of an object key: `"posts/a.md"` -> `"a.md"`.
fn bare_filename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Filenames that are never essays: the repo README, dotfiles, and
/// test fixtures. Excluded before any processing, so they appear in
/// neither artifact.
fn is_excluded_filename(filename: &str) -> bool {
    filename == "README.md"
        || filename.starts_with('.')
        || filename.to_lowercase().contains("test")
}

/// Articles whose extracted title marks them as test content are dropped
/// from the essay list (their filename still counts as processed).
fn is_test_title(title: &str) -> bool {
    title.to_lowercase().contains("test")
}

/// Derived `.html` key for a markdown key, used in legacy-link mode.
fn html_key(key: &str) -> String {
    match key.strip_suffix(".md") {
        Some(stem) => format!("{stem}.html"),
        None => key.to_string(),
    }
}

/// Build an index from `(object key, content)` pairs in enumeration order.
///
/// `None` content marks an object that could not be downloaded or decoded;
/// it contributes a fallback record synthesized from its filename rather
/// than aborting the run. With `html_links` set, every accepted record also
/// carries the derived `.html` key (legacy deployment variant).
///
/// Filtering and dedup rules, applied in order per entry:
/// 1. a key already processed this run is skipped entirely;
/// 2. `README.md`, dotfiles, and test-named files are excluded outright
///    (neither artifact sees them);
/// 3. a record whose extracted title marks it as test content is dropped
///    from the essay list, though its filename still counts as processed;
/// 4. a record whose normalized title was already accepted is dropped and
///    counted in `duplicates_skipped`, but its filename still appears in
///    the file list.
///
/// Accepted records are sorted newest-first by [`parse_sort_date`]; the
/// sort is stable, so unparsable dates keep their enumeration order at the
/// end.
pub fn build_index<I>(entries: I, html_links: bool) -> IndexOutcome
where
    I: IntoIterator<Item = (String, Option<String>)>,
{
    let mut seen_keys: HashSet<String> = HashSet::new();
    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut essays: Vec<EssayRecord> = Vec::new();
    let mut file_names: Vec<String> = Vec::new();
    let mut duplicates_skipped = 0usize;

    for (key, content) in entries {
        if !seen_keys.insert(key.clone()) {
            continue;
        }
        let filename = bare_filename(&key).to_string();
        if is_excluded_filename(&filename) {
            info!(%key, "Skipping non-essay file");
            continue;
        }
        file_names.push(filename.clone());

        let mut record = match content {
            Some(text) => extract_metadata(&text, &filename),
            None => {
                warn!(%key, "Object unreadable; synthesizing fallback record");
                fallback_record(&filename)
            }
        };

        if is_test_title(&record.title) {
            info!(%key, title = %record.title, "Skipping test article");
            continue;
        }

        let normalized = normalize_title(&record.title);
        if !seen_titles.insert(normalized) {
            duplicates_skipped += 1;
            continue;
        }

        record.file_link = key.clone();
        if html_links {
            record.html_link = Some(html_key(&key));
        }
        essays.push(record);
    }

    essays.sort_by_key(|r| Reverse(parse_sort_date(&r.date)));
    let file_names = file_names.into_iter().sorted().collect();

    IndexOutcome {
        essays,
        file_names,
        duplicates_skipped,
    }
}

/// Enumerate every `.md` object key for a run.
///
/// Keys under `prefix` come first, in listing order. With `scan_root`, the
/// bucket root is swept as well and stray top-level `.md` keys not under
/// the prefix are appended (key dedup in [`build_index`] handles overlap
/// when no prefix is set).
async fn collect_markdown_keys(
    bucket: &Bucket,
    prefix: Option<&str>,
    scan_root: bool,
) -> Result<Vec<String>, Box<dyn Error>> {
    let mut keys = Vec::new();

    {
        let stream = bucket.list_keys(prefix);
        pin_mut!(stream);
        while let Some(key) = stream.next().await {
            let key = key?;
            if key.ends_with(".md") {
                keys.push(key);
            }
        }
    }

    if scan_root && prefix.is_some() {
        let stream = bucket.list_keys(None);
        pin_mut!(stream);
        while let Some(key) = stream.next().await {
            let key = key?;
            if key.ends_with(".md") && !key.contains('/') {
                keys.push(key);
            }
        }
    }

    Ok(keys)
}

/// Run a full indexing pass over the bucket and republish both artifacts.
///
/// Per-object download failures degrade to fallback records and the run
/// continues; listing failures and artifact-write failures propagate to the
/// caller (the handler boundary converts them into a failure response).
#[instrument(level = "info", skip_all, fields(bucket = %bucket.name(), ?prefix))]
pub async fn run_index(
    bucket: &Bucket,
    prefix: Option<&str>,
    scan_root: bool,
    html_links: bool,
) -> Result<IndexOutcome, Box<dyn Error>> {
    let keys = collect_markdown_keys(bucket, prefix, scan_root).await?;
    info!(count = keys.len(), "Enumerated markdown objects");

    let mut entries: Vec<(String, Option<String>)> = Vec::with_capacity(keys.len());
    for key in keys {
        let content = match bucket.get_text(&key).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(%key, error = %e, "Download failed; degrading to fallback record");
                None
            }
        };
        entries.push((key, content));
    }

    let outcome = build_index(entries, html_links);
    info!(
        essays = outcome.essays.len(),
        files = outcome.file_names.len(),
        duplicates_skipped = outcome.duplicates_skipped,
        "Index built"
    );

    bucket.put_json(ESSAYS_DATA_KEY, &outcome.essays).await?;
    bucket.put_json(FILE_LIST_KEY, &outcome.file_names).await?;
    info!(
        essays_key = ESSAYS_DATA_KEY,
        file_list_key = FILE_LIST_KEY,
        "Republished index artifacts"
    );

    Ok(outcome)
}
