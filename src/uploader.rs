//! Directory-tree uploader.
//!
//! Pushes every regular file beneath a local root to the bucket. Top-level
//! files land under their bare filename; files in subdirectories keep their
//! relative path as the key, so a static-site tree uploads with its layout
//! intact. One failed upload is logged and skipped; it never aborts the
//! remaining files.

use crate::storage::Bucket;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument, warn};

/// Result of one tree upload.
#[derive(Debug, Default)]
pub struct UploadReport {
    /// Keys successfully uploaded, in walk order.
    pub uploaded: Vec<String>,
    /// Regular files considered, including ones that failed to upload.
    pub total_files: usize,
}

/// Compute the destination key for a file under `root`.
///
/// Files directly in the root map to their bare filename; nested files map
/// to their `/`-separated relative path. `key_prefix`, when present, is
/// prepended verbatim (callers pass a trailing slash, e.g. `"posts/"`).
pub fn key_for(root: &Path, path: &Path, key_prefix: Option<&str>) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let rel: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if rel.is_empty() {
        return None;
    }
    Some(format!("{}{}", key_prefix.unwrap_or(""), rel.join("/")))
}

/// Collect every regular file beneath `root`, sorted for a deterministic
/// upload order.
fn collect_files(root: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Upload every regular file beneath `root` to the bucket.
///
/// Returns the list of successfully uploaded keys and the total file count
/// considered. Fails only if the root itself cannot be walked; individual
/// upload failures are logged and skipped.
#[instrument(level = "info", skip_all, fields(bucket = %bucket.name(), root = %root.display()))]
pub async fn upload_tree(
    bucket: &Bucket,
    root: &Path,
    key_prefix: Option<&str>,
) -> Result<UploadReport, Box<dyn Error>> {
    let mut report = UploadReport::default();

    if !root.is_dir() {
        warn!("Upload root does not exist; nothing to upload");
        return Ok(report);
    }

    for path in collect_files(root)? {
        report.total_files += 1;
        let Some(key) = key_for(root, &path, key_prefix) else {
            continue;
        };

        match bucket.upload_file(&path, &key).await {
            Ok(()) => {
                info!(%key, "Uploaded file");
                report.uploaded.push(key);
            }
            Err(e) => {
                error!(%key, error = %e, "Upload failed; skipping file");
            }
        }
    }

    info!(
        uploaded = report.uploaded.len(),
        total = report.total_files,
        "Tree upload finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_for_top_level_file() {
        let root = Path::new("/site");
        let path = Path::new("/site/index.html");
        assert_eq!(key_for(root, path, None), Some("index.html".to_string()));
    }

    #[test]
    fn test_key_for_nested_file_preserves_structure() {
        let root = Path::new("/site");
        let path = Path::new("/site/assets/css/style.css");
        assert_eq!(
            key_for(root, path, None),
            Some("assets/css/style.css".to_string())
        );
    }

    #[test]
    fn test_key_for_with_prefix() {
        let root = Path::new("/tmp/scrape");
        let path = Path::new("/tmp/scrape/my-post.md");
        assert_eq!(
            key_for(root, path, Some("posts/")),
            Some("posts/my-post.md".to_string())
        );
    }

    #[test]
    fn test_key_for_path_outside_root() {
        let root = Path::new("/site");
        let path = Path::new("/elsewhere/file.txt");
        assert_eq!(key_for(root, path, None), None);
    }

    #[test]
    fn test_collect_files_walks_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/app.js"), "// js").unwrap();

        let files = collect_files(dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| key_for(dir.path(), p, None).unwrap())
            .collect();
        assert_eq!(names, vec!["assets/app.js", "index.html"]);
    }
}
