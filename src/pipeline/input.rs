//! Input resolution: load a user-supplied manifest path or URL into memory.
//!
//! Manifests are small (one row per historical report), so both local files
//! and downloads are read fully into a byte buffer before parsing. Local
//! paths may also be given as `file://` URIs.

use crate::error::BackfillError;
use std::path::PathBuf;
use tracing::{debug, info};

/// Raw manifest bytes together with the URI they came from.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    pub uri: String,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like an HTTP(S) URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the manifest URI and read its contents.
///
/// If the input is a URL, download it. Otherwise treat it as a local path.
pub async fn resolve_input(uri: &str, timeout_secs: u64) -> Result<ManifestSource, BackfillError> {
    let bytes = if is_url(uri) {
        download_url(uri, timeout_secs).await?
    } else {
        read_local(uri).await?
    };
    Ok(ManifestSource {
        uri: uri.to_string(),
        bytes,
    })
}

/// Read a local manifest file, mapping I/O failures to `ResourceUnavailable`.
async fn read_local(uri: &str) -> Result<Vec<u8>, BackfillError> {
    let path = PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri));

    if uri.trim().is_empty() {
        return Err(BackfillError::ResourceUnavailable {
            uri: uri.to_string(),
            reason: "empty manifest path".into(),
        });
    }

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        let reason = match e.kind() {
            std::io::ErrorKind::NotFound => "file not found".to_string(),
            std::io::ErrorKind::PermissionDenied => "permission denied".to_string(),
            _ => e.to_string(),
        };
        BackfillError::ResourceUnavailable {
            uri: uri.to_string(),
            reason,
        }
    })?;

    debug!("Read local manifest: {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, BackfillError> {
    info!("Downloading manifest from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| BackfillError::Internal(format!("HTTP client: {e}")))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            BackfillError::DownloadTimeout {
                uri: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            BackfillError::ResourceUnavailable {
                uri: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(BackfillError::ResourceUnavailable {
            uri: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| BackfillError::ResourceUnavailable {
            uri: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}
