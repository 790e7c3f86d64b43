//! Newsletter scrapers.
//!
//! Each scraper follows a consistent two-phase pattern:
//!
//! 1. **Indexing**: discover post URLs from the site's feed
//! 2. **Fetching**: download each post and render it to markdown + HTML
//!    files on local disk
//!
//! Scrapers are external collaborators to the indexing pipeline: the
//! indexer only ever sees whatever markdown ends up in the bucket, so a
//! scraper failure degrades the run to reindexing existing content instead
//! of aborting it. Failed posts are logged and skipped.

pub mod substack;
