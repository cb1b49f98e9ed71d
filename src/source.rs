//! Collaborator interfaces the manifest core reads from.
//!
//! The core never touches storage directly. Everything it needs from the
//! content system comes through these traits:
//!
//! | Trait | Provides |
//! |---|---|
//! | [`Entity`] | field presence, first raw value, reference target, file attachments |
//! | [`EntityResolver`] | content path → entity, reference → entity |
//! | [`TranscriptSource`] | media attached to an entity (extracted text) |
//! | [`LocalPaths`] | storage URI → local filesystem path |
//!
//! [`content::ContentStore`](crate::content::ContentStore) implements all of
//! them over a JSON document; tests use in-memory fixtures.

use std::path::PathBuf;
use thiserror::Error;

/// Media kind whose text field holds a page transcript.
pub const EXTRACTED_TEXT: &str = "extracted_text";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No entity at path: {0}")]
    NotFound(String),
    #[error("Invalid content path: {0}")]
    InvalidPath(String),
}

/// Typed pointer to another entity, as stored in a reference field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub entity_type: String,
    pub id: String,
}

/// A file or image attached to an entity field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Publicly resolvable URL of the file.
    pub url: String,
    /// Storage URI (`public://…`), when the file is managed by the store.
    pub uri: Option<String>,
    pub mime_type: String,
    /// Stored image properties, if the store recorded them on upload.
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A media item attached to an entity (transcripts, derivatives, …).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub kind: String,
    pub text: Option<String>,
}

/// Uniform field access over whatever backs an entity.
pub trait Entity {
    fn id(&self) -> &str;

    /// Display title.
    fn title(&self) -> Option<&str>;

    fn has_field(&self, name: &str) -> bool;

    /// First raw value of a field, rendered as a string.
    fn field_value(&self, name: &str) -> Option<String>;

    /// Target of the first item of a reference field.
    fn reference_target(&self, name: &str) -> Option<EntityRef>;

    /// All file attachments held by a field, in field order.
    fn attachments(&self, name: &str) -> Vec<Attachment>;
}

/// A result row: one entity per row, in listing order.
pub type Row<'a> = Box<dyn Entity + 'a>;

pub trait EntityResolver {
    /// Resolve a content path such as `/node/1` to its entity.
    fn resolve_path(&self, path: &str) -> Result<Row<'_>, ResolveError>;

    /// Load the entity a reference field points at.
    fn load(&self, target: &EntityRef) -> Option<Row<'_>>;
}

pub trait TranscriptSource {
    /// All media associated with `entity`, in discovery order.
    fn media_of(&self, entity: &dyn Entity) -> Vec<Media>;
}

pub trait LocalPaths {
    /// Local filesystem path for a managed attachment.
    fn local_path(&self, attachment: &Attachment) -> Option<PathBuf>;
}
