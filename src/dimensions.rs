//! Image dimension resolution.
//!
//! Every canvas needs a width and height, but nothing guarantees the content
//! store knows them. Resolution walks three tiers and stops at the first that
//! yields both sides:
//!
//! ```text
//! 1. Probe    GET {image_server}/{urlencoded file url}  → info JSON width/height
//! 2. Stored   width/height recorded on the attachment at upload time
//! 3. Local    image/tiff only: read the raster header from the local file
//! ```
//!
//! If every tier fails the canvas gets whatever the stored tier held, which is
//! `0 × 0` when the store recorded nothing. Failures are logged and never
//! surfaced: a broken image server degrades the manifest, it does not abort it.
//!
//! There is no caching and no batching: one probe per attachment, serially,
//! each bounded by the client timeout.

use crate::imaging::{Dimensions, ImageBackend};
use crate::source::{Attachment, LocalPaths};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Only this MIME type is inspected locally when earlier tiers fail.
pub const LOCAL_INSPECTION_MIME: &str = "image/tiff";

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Image server returned HTTP {0}")]
    Status(u16),
    #[error("Invalid info response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Info response has no usable width/height")]
    MissingDimensions,
}

/// Remote lookup of intrinsic image size.
pub trait ImageInfoProbe {
    fn probe(&self, file_url: &str) -> Result<Dimensions, ProbeError>;
}

/// The subset of an image server info response we read.
#[derive(Debug, Deserialize)]
struct InfoResponse {
    width: Option<u32>,
    height: Option<u32>,
}

/// Build the probe URL for a file.
///
/// The file URL is form-urlencoded as a single path segment and appended to
/// the image server base, with any trailing slashes on the base removed.
///
/// ```text
/// probe_url("https://iiif/iiif/3/", "https://x/a b.jpg")
///   → "https://iiif/iiif/3/https%3A%2F%2Fx%2Fa+b.jpg"
/// ```
pub fn probe_url(image_server_url: &str, file_url: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(file_url.as_bytes()).collect();
    format!("{}/{}", image_server_url.trim_end_matches('/'), encoded)
}

/// Probe backed by a blocking HTTP client.
pub struct HttpProbe {
    client: reqwest::blocking::Client,
    image_server_url: String,
}

impl HttpProbe {
    /// Build a probe whose every request is bounded by `timeout`.
    pub fn new(image_server_url: &str, timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            image_server_url: image_server_url.to_string(),
        })
    }
}

impl ImageInfoProbe for HttpProbe {
    fn probe(&self, file_url: &str) -> Result<Dimensions, ProbeError> {
        let url = probe_url(&self.image_server_url, file_url);
        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Status(status.as_u16()));
        }
        let body = response.text()?;
        let info: InfoResponse = serde_json::from_str(&body)?;
        match (info.width, info.height) {
            (Some(width), Some(height)) if width > 0 && height > 0 => {
                Ok(Dimensions { width, height })
            }
            _ => Err(ProbeError::MissingDimensions),
        }
    }
}

/// Tiered dimension lookup for attachments.
pub struct DimensionResolver<'a> {
    probe: &'a dyn ImageInfoProbe,
    inspector: &'a dyn ImageBackend,
    paths: &'a dyn LocalPaths,
}

impl<'a> DimensionResolver<'a> {
    pub fn new(
        probe: &'a dyn ImageInfoProbe,
        inspector: &'a dyn ImageBackend,
        paths: &'a dyn LocalPaths,
    ) -> Self {
        Self {
            probe,
            inspector,
            paths,
        }
    }

    /// Resolve width and height for one attachment. Never fails.
    pub fn resolve(&self, attachment: &Attachment) -> Dimensions {
        match self.probe.probe(&attachment.url) {
            Ok(dims) => {
                tracing::debug!(url = %attachment.url, ?dims, "dimensions from image server");
                return dims;
            }
            Err(e) => {
                tracing::warn!(url = %attachment.url, error = %e, "image server probe failed");
            }
        }

        let stored = Dimensions {
            width: attachment.width.unwrap_or(0),
            height: attachment.height.unwrap_or(0),
        };
        if stored.is_known() {
            tracing::debug!(url = %attachment.url, dims = ?stored, "dimensions from stored properties");
            return stored;
        }

        if attachment
            .mime_type
            .eq_ignore_ascii_case(LOCAL_INSPECTION_MIME)
        {
            if let Some(local) = self.inspect_locally(attachment) {
                return local;
            }
        }

        tracing::debug!(url = %attachment.url, dims = ?stored, "dimensions unresolved");
        stored
    }

    fn inspect_locally(&self, attachment: &Attachment) -> Option<Dimensions> {
        let Some(path) = self.paths.local_path(attachment) else {
            tracing::debug!(url = %attachment.url, "no local path for attachment");
            return None;
        };
        match self.inspector.identify(&path) {
            Ok(dims) if dims.is_known() => {
                tracing::debug!(path = %path.display(), ?dims, "dimensions from local header");
                Some(dims)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "local header read failed");
                None
            }
        }
    }
}
