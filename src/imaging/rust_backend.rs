//! Pure Rust image inspector built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Header read (JPEG, PNG, TIFF) | `image::ImageReader::into_dimensions` |
//! | Format detection | extension first, then magic bytes |

use super::backend::{BackendError, Dimensions, ImageBackend};
use image::ImageReader;
use std::path::Path;

/// Header-only inspector using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let reader = ImageReader::open(path)
            .map_err(BackendError::Io)?
            .with_guessed_format()
            .map_err(BackendError::Io)?;
        let (width, height) = reader.into_dimensions().map_err(|e| {
            BackendError::Unreadable(format!("{}: {}", path.display(), e))
        })?;
        Ok(Dimensions { width, height })
    }
}
