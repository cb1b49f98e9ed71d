//! Local image inspection: pure Rust, header reads only.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//!
//! The module is split into:
//! - **Backend**: [`ImageBackend`] trait + [`Dimensions`]
//! - **RustBackend**: the `image`-crate implementation

pub mod backend;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use rust_backend::RustBackend;
