//! Shared test utilities for the simple-iiif test suite.
//!
//! Provides in-memory collaborators (entities, resolver, transcripts, local
//! paths), probe doubles, and a tiny canned HTTP server for exercising the
//! real [`HttpProbe`](crate::dimensions::HttpProbe).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let book = FakeEntity::new("1")
//!     .titled("Book")
//!     .with_value("field_creator", "Jane")
//!     .with_files("field_images", vec![image_attachment("https://x/p1.jpg", "image/jpeg", None)]);
//! let store = FakeStore::new().with_entity("/node/1", book);
//! ```

use std::collections::BTreeMap;
use std::io::{Read as _, Write as _};
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::dimensions::{ImageInfoProbe, ProbeError};
use crate::imaging::Dimensions;
use crate::source::{
    Attachment, Entity, EntityRef, EntityResolver, LocalPaths, Media, ResolveError, Row,
    TranscriptSource,
};

// =========================================================================
// Attachments and entities
// =========================================================================

/// Attachment with optional stored `(width, height)`.
pub fn image_attachment(url: &str, mime: &str, stored: Option<(u32, u32)>) -> Attachment {
    Attachment {
        url: url.to_string(),
        uri: None,
        mime_type: mime.to_string(),
        width: stored.map(|(w, _)| w),
        height: stored.map(|(_, h)| h),
    }
}

/// In-memory entity built field by field.
#[derive(Debug, Clone, Default)]
pub struct FakeEntity {
    pub id: String,
    pub title: Option<String>,
    values: BTreeMap<String, Vec<String>>,
    references: BTreeMap<String, EntityRef>,
    files: BTreeMap<String, Vec<Attachment>>,
}

impl FakeEntity {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_value(mut self, field: &str, value: &str) -> Self {
        self.values
            .entry(field.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    pub fn with_reference(mut self, field: &str, entity_type: &str, id: &str) -> Self {
        self.references.insert(
            field.to_string(),
            EntityRef {
                entity_type: entity_type.to_string(),
                id: id.to_string(),
            },
        );
        self
    }

    pub fn with_files(mut self, field: &str, files: Vec<Attachment>) -> Self {
        self.files.insert(field.to_string(), files);
        self
    }
}

impl Entity for FakeEntity {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn has_field(&self, name: &str) -> bool {
        self.values.contains_key(name)
            || self.references.contains_key(name)
            || self.files.contains_key(name)
    }

    fn field_value(&self, name: &str) -> Option<String> {
        if let Some(values) = self.values.get(name) {
            return values.first().cloned();
        }
        if let Some(target) = self.references.get(name) {
            return Some(target.id.clone());
        }
        self.files
            .get(name)
            .and_then(|files| files.first())
            .map(|f| f.url.clone())
    }

    fn reference_target(&self, name: &str) -> Option<EntityRef> {
        self.references.get(name).cloned()
    }

    fn attachments(&self, name: &str) -> Vec<Attachment> {
        self.files.get(name).cloned().unwrap_or_default()
    }
}

pub fn rows(entities: Vec<FakeEntity>) -> Vec<Row<'static>> {
    entities
        .into_iter()
        .map(|e| Box::new(e) as Row<'static>)
        .collect()
}

// =========================================================================
// Collaborator doubles
// =========================================================================

/// Resolver + transcript source over in-memory entities.
#[derive(Default)]
pub struct FakeStore {
    by_path: BTreeMap<String, FakeEntity>,
    references: Vec<(EntityRef, FakeEntity)>,
    media: BTreeMap<String, Vec<Media>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, path: &str, entity: FakeEntity) -> Self {
        self.by_path.insert(path.to_string(), entity);
        self
    }

    pub fn with_term(mut self, entity_type: &str, id: &str, name: &str) -> Self {
        let target = EntityRef {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        };
        let term = FakeEntity::new(id).with_value("name", name);
        self.references.push((target, term));
        self
    }

    pub fn with_media(mut self, entity_id: &str, kind: &str, text: Option<&str>) -> Self {
        self.media
            .entry(entity_id.to_string())
            .or_default()
            .push(Media {
                kind: kind.to_string(),
                text: text.map(String::from),
            });
        self
    }
}

impl EntityResolver for FakeStore {
    fn resolve_path(&self, path: &str) -> Result<Row<'_>, ResolveError> {
        self.by_path
            .get(path)
            .map(|e| Box::new(e.clone()) as Row<'_>)
            .ok_or_else(|| ResolveError::NotFound(path.to_string()))
    }

    fn load(&self, target: &EntityRef) -> Option<Row<'_>> {
        self.references
            .iter()
            .find(|(r, _)| r == target)
            .map(|(_, e)| Box::new(e.clone()) as Row<'_>)
    }
}

impl TranscriptSource for FakeStore {
    fn media_of(&self, entity: &dyn Entity) -> Vec<Media> {
        self.media.get(entity.id()).cloned().unwrap_or_default()
    }
}

/// Local path lookup that always answers with the same path (or nothing).
pub struct FixedPaths(pub Option<PathBuf>);

impl FixedPaths {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn to(path: &str) -> Self {
        Self(Some(PathBuf::from(path)))
    }
}

impl LocalPaths for FixedPaths {
    fn local_path(&self, _attachment: &Attachment) -> Option<PathBuf> {
        self.0.clone()
    }
}

/// Probe that answers every lookup with the same dimensions.
pub struct StaticProbe {
    dims: Dimensions,
    calls: Mutex<Vec<String>>,
}

impl StaticProbe {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            dims: Dimensions::new(width, height),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ImageInfoProbe for StaticProbe {
    fn probe(&self, file_url: &str) -> Result<Dimensions, ProbeError> {
        self.calls.lock().unwrap().push(file_url.to_string());
        Ok(self.dims)
    }
}

/// Probe whose image server is always down.
pub struct FailingProbe;

impl ImageInfoProbe for FailingProbe {
    fn probe(&self, _file_url: &str) -> Result<Dimensions, ProbeError> {
        Err(ProbeError::Status(503))
    }
}

// =========================================================================
// Canned HTTP server
// =========================================================================

/// Serves a fixed sequence of responses, one per connection, then exits.
pub struct CannedServer {
    port: u16,
    paths: Arc<Mutex<Vec<String>>>,
}

impl CannedServer {
    pub fn start(responses: Vec<(&'static str, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let paths = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&paths);

        thread::spawn(move || {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
                let mut buf = [0u8; 4096];
                let n = stream.read(&mut buf).unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let path = request.split_whitespace().nth(1).unwrap_or("/");
                seen.lock().unwrap().push(path.to_string());

                let response = format!(
                    "HTTP/1.1 {status}\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\
                     \r\n\
                     {body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        Self { port, paths }
    }

    /// Accepts a connection and never answers.
    pub fn silent() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                thread::sleep(Duration::from_secs(3));
                drop(stream);
            }
        });
        Self {
            port,
            paths: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Request paths seen so far, in arrival order.
    pub fn request_paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

/// URL of a local port with nothing listening on it.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}
