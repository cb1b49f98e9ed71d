//! Local image inspection trait and shared types.
//!
//! The [`ImageBackend`] trait is the last-resort tier of dimension
//! resolution: given a file on disk, read its raster header and report
//! width and height. No pixel data is decoded.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unreadable image header: {0}")]
    Unreadable(String),
}

/// Intrinsic pixel size of an image.
///
/// `0` means unknown; see [`Dimensions::is_known`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const UNKNOWN: Dimensions = Dimensions {
        width: 0,
        height: 0,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both sides are non-zero.
    pub fn is_known(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Trait for local image inspectors.
pub trait ImageBackend {
    /// Read image dimensions from the file header.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;
}
