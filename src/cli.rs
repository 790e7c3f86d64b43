//! Command-line interface definitions for the mirror pipeline.
//!
//! All options can be provided via command-line flags or the environment
//! variables the deployment sets (`BUCKET_NAME`, `SUBSTACK_URL`,
//! `NUM_POSTS_TO_SCRAPE`), so the scheduled trigger only needs to pick a
//! subcommand.

use clap::{Parser, Subcommand};

/// Command-line arguments for the Substack mirror pipeline.
///
/// # Examples
///
/// ```sh
/// # Full pipeline run against the production bucket
/// substack_mirror --bucket withliberty.example.com run \
///     --site-url https://example.substack.com/ --static-dir ./static_site
///
/// # Placeholder smoke test (no scraping, no indexing)
/// substack_mirror --bucket tiny-article-backup smoke
///
/// # Local run against LocalStack
/// substack_mirror --bucket test --endpoint http://localhost:4566 smoke
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Target S3 bucket name
    #[arg(short, long, env = "BUCKET_NAME")]
    pub bucket: String,

    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Custom S3 endpoint URL (LocalStack); enables path-style addressing
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape the publication, upload markdown, and rebuild the index
    Run {
        /// Publication base URL
        #[arg(short, long, env = "SUBSTACK_URL")]
        site_url: String,

        /// Maximum posts to scrape (0 = unbounded)
        #[arg(short, long, env = "NUM_POSTS_TO_SCRAPE", default_value_t = 0)]
        max_posts: usize,

        /// Key prefix for scraped markdown objects
        #[arg(long, default_value = "posts/")]
        posts_prefix: String,

        /// Local static-site tree to upload to the bucket root
        #[arg(long)]
        static_dir: Option<String>,

        /// Emit derived .html links in essay records (legacy site)
        #[arg(long)]
        html_links: bool,

        /// Legacy bucket to seed essays-data.json from (read-only)
        #[arg(long, env = "LEGACY_BUCKET")]
        legacy_bucket: Option<String>,
    },

    /// Write a single timestamped placeholder object and exit
    Smoke,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_smoke_parsing() {
        let cli = Cli::parse_from(["substack_mirror", "--bucket", "test-bucket", "smoke"]);

        assert_eq!(cli.bucket, "test-bucket");
        assert_eq!(cli.region, "us-east-1");
        assert!(matches!(cli.command, Command::Smoke));
    }

    #[test]
    fn test_cli_run_parsing() {
        let cli = Cli::parse_from([
            "substack_mirror",
            "-b",
            "test-bucket",
            "run",
            "--site-url",
            "https://example.substack.com/",
            "--max-posts",
            "50",
            "--static-dir",
            "./static_site",
        ]);

        let Command::Run {
            site_url,
            max_posts,
            posts_prefix,
            static_dir,
            html_links,
            legacy_bucket,
        } = cli.command
        else {
            panic!("expected run subcommand");
        };

        assert_eq!(site_url, "https://example.substack.com/");
        assert_eq!(max_posts, 50);
        assert_eq!(posts_prefix, "posts/");
        assert_eq!(static_dir, Some("./static_site".to_string()));
        assert!(!html_links);
        assert_eq!(legacy_bucket, None);
    }

    #[test]
    fn test_cli_run_defaults_to_unbounded_scrape() {
        let cli = Cli::parse_from([
            "substack_mirror",
            "--bucket",
            "b",
            "run",
            "--site-url",
            "https://example.substack.com/",
        ]);

        let Command::Run { max_posts, .. } = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(max_posts, 0);
    }
}
