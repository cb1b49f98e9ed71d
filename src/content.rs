//! JSON-backed content store.
//!
//! A single JSON document stands in for the content system: entities with
//! their field items, media attached to them, and the ordered result rows of
//! a listing. [`ContentStore`] implements every collaborator trait in
//! [`source`](crate::source), so the CLI can build manifests from an export.
//!
//! ```json
//! {
//!   "base_url": "https://x",
//!   "files_dir": "files",
//!   "entities": [
//!     { "type": "node", "id": "1", "path": "/node/1", "title": "Book",
//!       "fields": {
//!         "field_creator": [{ "value": "Jane" }],
//!         "field_digital_library": [{ "target_type": "taxonomy_term", "target_id": 7 }],
//!         "field_images": [{ "uri": "public://p1.jpg", "mime": "image/jpeg" }]
//!       } }
//!   ],
//!   "media": [{ "kind": "extracted_text", "media_of": "1", "text": "…" }],
//!   "rows": ["1"]
//! }
//! ```
//!
//! Rows name entities as `type/id`; a bare id is a `node`.
//!
//! ## Field items
//!
//! Each field holds a list of items of one of three shapes, tried in order:
//!
//! | Shape | Recognised by | Raw value |
//! |---|---|---|
//! | File | `mime` | public URL |
//! | Reference | `target_id` | target id |
//! | Value | `value` | the value, strings verbatim, other JSON rendered |
//!
//! ## Files
//!
//! A file's public URL is its `url` if given, otherwise derived from its
//! storage `uri`:
//!
//! - `public://rel` → `{files_url}/rel` (default `{base_url}/sites/default/files`)
//! - `private://rel` → `{base_url}/system/files/rel`
//!
//! Local paths exist only for `public://` files: `{files_dir}/rel`, with a
//! relative `files_dir` taken from the store file's directory.

use crate::source::{
    Attachment, Entity, EntityRef, EntityResolver, LocalPaths, Media, ResolveError, Row,
    TranscriptSource,
};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid content store: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Duplicate entity {0}/{1}")]
    DuplicateEntity(String, String),
}

/// The whole content export.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentStore {
    pub base_url: String,
    #[serde(default)]
    pub files_url: Option<String>,
    #[serde(default = "default_files_dir")]
    pub files_dir: PathBuf,
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    #[serde(default)]
    pub media: Vec<MediaRecord>,
    /// Entity ids of the listing's result rows, in order.
    #[serde(default)]
    pub rows: Vec<String>,
    /// Directory relative `files_dir` paths resolve against.
    #[serde(skip)]
    root: PathBuf,
}

fn default_files_dir() -> PathBuf {
    PathBuf::from("files")
}

fn default_entity_type() -> String {
    "node".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityRecord {
    #[serde(rename = "type", default = "default_entity_type")]
    pub entity_type: String,
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<FieldItem>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldItem {
    File(FileItem),
    Reference {
        #[serde(default = "default_target_type")]
        target_type: String,
        #[serde(deserialize_with = "id_string")]
        target_id: String,
    },
    Value {
        value: serde_json::Value,
    },
}

fn default_target_type() -> String {
    "taxonomy_term".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileItem {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub mime: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediaRecord {
    pub kind: String,
    #[serde(deserialize_with = "id_string")]
    pub media_of: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Ids may be written as strings or numbers; both are kept as strings.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

impl ContentStore {
    /// Load a store from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let content = fs::read_to_string(path)?;
        let root = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Self::from_json(&content, root)
    }

    /// Parse a store, resolving relative `files_dir` against `root`.
    pub fn from_json(json: &str, root: PathBuf) -> Result<Self, ContentError> {
        let mut store: ContentStore = serde_json::from_str(json)?;
        store.root = root;

        let mut seen = HashSet::new();
        for record in &store.entities {
            if !seen.insert((record.entity_type.as_str(), record.id.as_str())) {
                return Err(ContentError::DuplicateEntity(
                    record.entity_type.clone(),
                    record.id.clone(),
                ));
            }
        }
        Ok(store)
    }

    /// Result rows for `ids`, or for the store's own `rows` list.
    ///
    /// A row is `type/id`, or a bare `id` meaning a `node`. Rows that match
    /// no entity are skipped.
    pub fn rows(&self, ids: Option<&[String]>) -> Vec<Row<'_>> {
        ids.unwrap_or(self.rows.as_slice())
            .iter()
            .filter_map(|row| {
                let found = self.find_row(row);
                if found.is_none() {
                    tracing::warn!(row = %row, "row references unknown entity");
                }
                found
            })
            .map(|record| Box::new(self.view(record)) as Row<'_>)
            .collect()
    }

    /// Unresolved rows, for reporting.
    pub fn missing_rows<'a>(&self, ids: &'a [String]) -> Vec<&'a str> {
        ids.iter()
            .filter(|row| self.find_row(row).is_none())
            .map(String::as_str)
            .collect()
    }

    fn find_row(&self, row: &str) -> Option<&EntityRecord> {
        let (entity_type, id) = match row.split_once('/') {
            Some((entity_type, id)) => (entity_type.to_string(), id),
            None => (default_entity_type(), row),
        };
        self.entities
            .iter()
            .find(|r| r.entity_type == entity_type && r.id == id)
    }

    fn view<'a>(&'a self, record: &'a EntityRecord) -> RecordView<'a> {
        RecordView {
            store: self,
            record,
        }
    }

    fn files_url(&self) -> String {
        match &self.files_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!(
                "{}/sites/default/files",
                self.base_url.trim_end_matches('/')
            ),
        }
    }

    /// Public URL for a file item.
    fn public_url(&self, file: &FileItem) -> Option<String> {
        if let Some(url) = &file.url {
            return Some(url.clone());
        }
        let uri = file.uri.as_deref()?;
        if let Some(rel) = uri.strip_prefix("public://") {
            return Some(join_url(&self.files_url(), rel));
        }
        if let Some(rel) = uri.strip_prefix("private://") {
            let base = format!("{}/system/files", self.base_url.trim_end_matches('/'));
            return Some(join_url(&base, rel));
        }
        None
    }

    fn attachment(&self, file: &FileItem) -> Option<Attachment> {
        let Some(url) = self.public_url(file) else {
            tracing::warn!(uri = ?file.uri, "file has no resolvable public URL");
            return None;
        };
        Some(Attachment {
            url,
            uri: file.uri.clone(),
            mime_type: file.mime.clone(),
            width: file.width,
            height: file.height,
        })
    }
}

/// Append a relative file path to a base URL, percent-encoding each segment.
fn join_url(base: &str, rel: &str) -> String {
    match url::Url::parse(base) {
        Ok(mut url) => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty().extend(rel.split('/'));
            }
            url.to_string()
        }
        Err(_) => format!("{base}/{rel}"),
    }
}

/// An entity record seen through the store it came from.
pub struct RecordView<'a> {
    store: &'a ContentStore,
    record: &'a EntityRecord,
}

impl RecordView<'_> {
    fn first_item(&self, name: &str) -> Option<&FieldItem> {
        self.record.fields.get(name).and_then(|items| items.first())
    }
}

impl Entity for RecordView<'_> {
    fn id(&self) -> &str {
        &self.record.id
    }

    fn title(&self) -> Option<&str> {
        self.record.title.as_deref()
    }

    fn has_field(&self, name: &str) -> bool {
        self.record.fields.contains_key(name)
    }

    fn field_value(&self, name: &str) -> Option<String> {
        match self.first_item(name)? {
            FieldItem::File(file) => self.store.public_url(file),
            FieldItem::Reference { target_id, .. } => Some(target_id.clone()),
            FieldItem::Value { value } => match value {
                serde_json::Value::Null => None,
                serde_json::Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            },
        }
    }

    fn reference_target(&self, name: &str) -> Option<EntityRef> {
        match self.first_item(name)? {
            FieldItem::Reference {
                target_type,
                target_id,
            } => Some(EntityRef {
                entity_type: target_type.clone(),
                id: target_id.clone(),
            }),
            _ => None,
        }
    }

    fn attachments(&self, name: &str) -> Vec<Attachment> {
        self.record
            .fields
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|item| match item {
                FieldItem::File(file) => self.store.attachment(file),
                _ => None,
            })
            .collect()
    }
}

impl EntityResolver for ContentStore {
    fn resolve_path(&self, path: &str) -> Result<Row<'_>, ResolveError> {
        let wanted = path.trim_end_matches('/');
        if wanted.is_empty() {
            return Err(ResolveError::InvalidPath(path.to_string()));
        }

        let by_alias = self.entities.iter().find(|r| {
            r.path
                .as_deref()
                .is_some_and(|p| p.trim_end_matches('/') == wanted)
        });
        let by_canonical = || {
            self.entities
                .iter()
                .find(|r| format!("/{}/{}", r.entity_type, r.id) == wanted)
        };

        by_alias
            .or_else(by_canonical)
            .map(|record| Box::new(self.view(record)) as Row<'_>)
            .ok_or_else(|| ResolveError::NotFound(path.to_string()))
    }

    fn load(&self, target: &EntityRef) -> Option<Row<'_>> {
        self.entities
            .iter()
            .find(|r| r.entity_type == target.entity_type && r.id == target.id)
            .map(|record| Box::new(self.view(record)) as Row<'_>)
    }
}

impl TranscriptSource for ContentStore {
    fn media_of(&self, entity: &dyn Entity) -> Vec<Media> {
        self.media
            .iter()
            .filter(|m| m.media_of == entity.id())
            .map(|m| Media {
                kind: m.kind.clone(),
                text: m.text.clone(),
            })
            .collect()
    }
}

impl LocalPaths for ContentStore {
    fn local_path(&self, attachment: &Attachment) -> Option<PathBuf> {
        let rel = attachment.uri.as_deref()?.strip_prefix("public://")?;
        Some(self.root.join(&self.files_dir).join(rel))
    }
}
