//! # Simple IIIF
//!
//! Builds IIIF Presentation 3 manifests from the result rows of a content
//! listing. Every image attached to a row becomes a canvas; the entity the
//! manifest URL points at supplies the label, descriptive metadata and
//! transcripts.
//!
//! # Architecture: One Request, One Pass
//!
//! A manifest is assembled synchronously for one request:
//!
//! ```text
//! request url ──► base id ──► entity ──► label, metadata, transcripts
//!      │
//! rows ──► tile fields ──► attachments ──► dimensions ──► canvases
//! ```
//!
//! Nothing here is fatal. The image server may be down, the entity may not
//! resolve, a field may be missing: each case degrades the document
//! (zero-sized canvas, fallback label, fewer entries) and is logged with
//! `tracing`. Only the edges fail: an unreadable config or content store.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`manifest`] | Assembly: request → [`manifest::ManifestDocument`] (`{}` without an image server) |
//! | [`canvas`] | One attachment → one canvas with its painting page and optional transcript page |
//! | [`dimensions`] | Width/height: image server probe → stored values → local TIFF header |
//! | [`metadata`] | Ordered label → field mapping into `metadata` entries, reference names resolved |
//! | [`source`] | Collaborator traits: [`source::Entity`], resolvers, transcripts, local paths |
//! | [`content`] | JSON content store implementing every collaborator trait |
//! | [`imaging`] | Local image header inspection via the `image` crate |
//! | [`config`] | Layered `config.toml` loading and validation |
//! | [`types`] | Presentation 3 resource types as serialized |
//! | [`output`] | CLI output formatting: canvas and store inventories |
//!
//! # Design Decisions
//!
//! ## Capabilities, Not Content Models
//!
//! Assembly never sees a concrete entity type. It asks an [`source::Entity`]
//! whether a field exists, for its first value, where a reference points and
//! which files it holds. Any content system that can answer those four
//! questions can drive it; [`content::ContentStore`] is the one shipped.
//!
//! ## Explicit Context
//!
//! The entity a manifest describes is resolved once and passed down to every
//! canvas as an argument. Canvas construction holds no state between calls.
//!
//! ## Blocking HTTP
//!
//! Dimension probes run one at a time, in row order, on a blocking `reqwest`
//! client with a per-request timeout. A manifest is request-scoped work with
//! no concurrency to exploit, so there is no async runtime.

pub mod canvas;
pub mod config;
pub mod content;
pub mod dimensions;
pub mod imaging;
pub mod manifest;
pub mod metadata;
pub mod output;
pub mod source;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
