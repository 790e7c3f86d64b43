//! Object storage access for the mirror bucket.
//!
//! Thin wrapper over the AWS S3 SDK scoped to a single bucket. Listing is
//! exposed as a lazy paginated stream so a large corpus never has to fit in
//! one response page. An optional endpoint override (with path-style
//! addressing) supports LocalStack for local runs.

use async_stream::try_stream;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use futures::Stream;
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tracing::{debug, info, instrument};

/// MIME type for a destination key, chosen by file extension.
///
/// Unrecognized extensions (including none) default to `text/html`, which
/// matches how the static site is served.
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        _ => "text/html",
    }
}

/// A handle to one S3 bucket.
#[derive(Debug, Clone)]
pub struct Bucket {
    client: Client,
    name: String,
}

impl Bucket {
    /// Connect to a bucket using the default AWS credential chain.
    ///
    /// `endpoint` overrides the S3 endpoint URL (LocalStack); when set,
    /// path-style addressing is enabled as well.
    #[instrument(level = "info", skip_all, fields(bucket = %name, region = %region))]
    pub async fn connect(name: &str, region: &str, endpoint: Option<&str>) -> Self {
        use aws_config::Region;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()));
        if let Some(url) = endpoint {
            loader = loader.endpoint_url(url);
        }
        let aws_config = loader.load().await;

        let builder = aws_sdk_s3::config::Builder::from(&aws_config);
        let s3_config = if endpoint.is_some() {
            builder.force_path_style(true).build()
        } else {
            builder.build()
        };

        info!("Connected S3 client");
        Self {
            client: Client::from_conf(s3_config),
            name: name.to_string(),
        }
    }

    /// The bucket name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A handle to a sibling bucket reachable through the same client.
    ///
    /// Used for the read-only legacy bucket that holds a pre-existing
    /// `essays-data.json`.
    pub fn sibling(&self, name: &str) -> Self {
        Self {
            client: self.client.clone(),
            name: name.to_string(),
        }
    }

    /// List object keys, handling pagination lazily.
    ///
    /// Yields keys in enumeration order, skipping directory markers and
    /// empty keys. A listing failure ends the stream with an error; callers
    /// propagate it (listing is not a recoverable per-object failure).
    pub fn list_keys<'a>(
        &'a self,
        prefix: Option<&str>,
    ) -> impl Stream<Item = Result<String, Box<dyn Error>>> + 'a {
        let prefix = prefix.map(|s| s.to_string());

        try_stream! {
            let mut continuation_token: Option<String> = None;

            loop {
                let mut req = self.client.list_objects_v2().bucket(&self.name);
                if let Some(ref prefix) = prefix {
                    req = req.prefix(prefix);
                }
                if let Some(ref token) = continuation_token {
                    req = req.continuation_token(token);
                }

                let resp = req.send().await.map_err(|e| {
                    Box::<dyn Error>::from(format!(
                        "listing s3://{} failed: {}",
                        self.name, e
                    ))
                })?;

                if let Some(contents) = resp.contents {
                    for obj in contents {
                        let key = obj.key.unwrap_or_default();
                        if key.is_empty() || key.ends_with('/') {
                            continue;
                        }
                        yield key;
                    }
                }

                if resp.is_truncated == Some(true) {
                    continuation_token = resp.next_continuation_token;
                    if continuation_token.is_none() {
                        break;
                    }
                } else {
                    break;
                }
            }
        }
    }

    /// Download an object and decode it as UTF-8 text.
    #[instrument(level = "debug", skip_all, fields(bucket = %self.name, %key))]
    pub async fn get_text(&self, key: &str) -> Result<String, Box<dyn Error>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.name)
            .key(key)
            .send()
            .await
            .map_err(|e| format!("downloading s3://{}/{} failed: {}", self.name, key, e))?;

        let bytes = resp
            .body
            .collect()
            .await
            .map_err(|e| format!("reading body of s3://{}/{} failed: {}", self.name, key, e))?
            .into_bytes();

        let text = String::from_utf8(bytes.to_vec())
            .map_err(|e| format!("s3://{}/{} is not valid UTF-8: {}", self.name, key, e))?;
        debug!(bytes = text.len(), "Downloaded object");
        Ok(text)
    }

    /// Upload raw bytes under a key with an explicit content type.
    #[instrument(level = "debug", skip_all, fields(bucket = %self.name, %key, %content_type))]
    pub async fn put_bytes(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), Box<dyn Error>> {
        self.client
            .put_object()
            .bucket(&self.name)
            .key(key)
            .body(body.into())
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| format!("uploading s3://{}/{} failed: {}", self.name, key, e))?;
        debug!("Uploaded object");
        Ok(())
    }

    /// Serialize a value as pretty-printed JSON and upload it.
    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), Box<dyn Error>> {
        let body = serde_json::to_vec_pretty(value)?;
        self.put_bytes(key, body, "application/json").await
    }

    /// Upload a local file, inferring the content type from the key.
    pub async fn upload_file(&self, path: &Path, key: &str) -> Result<(), Box<dyn Error>> {
        let body = tokio::fs::read(path).await?;
        self.put_bytes(key, body, content_type_for(key)).await
    }
}
