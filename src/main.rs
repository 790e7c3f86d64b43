//! # Substack Mirror
//!
//! A scheduled content-mirroring pipeline that scrapes a Substack
//! publication and republishes its posts and metadata as static
//! JSON/HTML artifacts in an S3 bucket.
//!
//! ## Usage
//!
//! ```sh
//! substack_mirror --bucket withliberty.example.com run \
//!     --site-url https://example.substack.com/ --static-dir ./static_site
//! ```
//!
//! ## Architecture
//!
//! One invocation is one run-to-completion batch:
//! 1. **Scraping**: discover posts from the publication feed and mirror
//!    each one to markdown + HTML on local scratch space
//! 2. **Uploading**: push the new markdown to the bucket under `posts/`
//! 3. **Indexing**: list every markdown object (old + new), extract
//!    metadata, dedup, sort, and republish `essays-data.json` and
//!    `file-list.json`
//! 4. **Static assets**: push the local static-site tree to the bucket root
//!
//! All derived state is rebuilt from the bucket each run; nothing persists
//! between invocations.

use clap::Parser;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod extract;
mod handlers;
mod indexer;
mod models;
mod scrapers;
mod storage;
mod uploader;
mod utils;

use cli::{Cli, Command};
use handlers::FullRunConfig;
use storage::Bucket;

#[tokio::main]
#[instrument]
async fn main() {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("substack_mirror starting up");

    let args = Cli::parse();
    debug!(?args.bucket, ?args.region, "Parsed CLI arguments");

    let bucket = Bucket::connect(&args.bucket, &args.region, args.endpoint.as_deref()).await;

    let response = match args.command {
        Command::Smoke => handlers::run_smoke(&bucket).await,
        Command::Run {
            site_url,
            max_posts,
            posts_prefix,
            static_dir,
            html_links,
            legacy_bucket,
        } => {
            let config = FullRunConfig {
                site_url,
                max_posts,
                posts_prefix,
                static_dir: static_dir.map(Into::into),
                html_links,
                legacy_bucket,
            };
            handlers::run_full(&bucket, &config).await
        }
    };

    let elapsed = start_time.elapsed();
    if response.is_success() {
        info!(
            status = response.status_code,
            body = %response.body,
            secs = elapsed.as_secs(),
            millis = elapsed.subsec_millis(),
            "Execution complete"
        );
    } else {
        error!(
            status = response.status_code,
            body = %response.body,
            secs = elapsed.as_secs(),
            "Execution failed"
        );
        std::process::exit(1);
    }
}
