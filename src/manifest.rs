//! Manifest assembly.
//!
//! Turns an ordered set of result rows into one IIIF Presentation 3 manifest:
//!
//! ```text
//! request url  https://x/node/1/manifest.json
//!   base id    https://x/node/1            (last path segment dropped)
//!   entity     resolve("/node/1")          → metadata, label, transcripts
//!
//! for row in rows
//!   for field in tile_fields (present on the row)
//!     for attachment in field
//!       dimensions → canvas → items[]
//! ```
//!
//! ## Degenerate output
//!
//! Without a configured image server there is nothing to tile against, and
//! the result is the empty JSON object `{}`. This is not an error.
//!
//! ## Canvas ids
//!
//! A canvas is `{base id}/item/{entity id}`. When one entity contributes
//! several attachments, the first keeps that id and later ones get `/2`,
//! `/3`, … appended, so ids stay unique within the manifest while
//! single-image entities keep their long-standing id.
//!
//! ## Failure model
//!
//! Nothing here fails. An unresolvable entity leaves metadata empty and the
//! label on its fallback; a missing field or empty attachment list adds no
//! canvas; dimension lookups degrade to zero. Everything is logged.

use crate::canvas::build_canvas;
use crate::config::ManifestConfig;
use crate::dimensions::DimensionResolver;
use crate::metadata::{build_metadata, resolve};
use crate::source::{Entity, EntityResolver, ResolveError, Row, TranscriptSource};
use crate::types::{Canvas, Manifest, MetadataEntry, PRESENTATION_CONTEXT};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// The inbound request the manifest answers.
#[derive(Debug, Clone, Copy)]
pub struct ManifestRequest<'a> {
    /// Full request URL; becomes the manifest `id`.
    pub url: &'a str,
    /// Title configured on the listing, if any.
    pub view_title: Option<&'a str>,
}

/// Collaborators used while assembling.
pub struct Sources<'a> {
    pub resolver: &'a dyn EntityResolver,
    pub transcripts: &'a dyn TranscriptSource,
    pub dimensions: DimensionResolver<'a>,
}

/// Assembly result: a full manifest, or `{}` when no image server is set.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestDocument {
    Degenerate,
    Manifest(Box<Manifest>),
}

impl ManifestDocument {
    pub fn manifest(&self) -> Option<&Manifest> {
        match self {
            ManifestDocument::Degenerate => None,
            ManifestDocument::Manifest(manifest) => Some(manifest),
        }
    }

    /// Serialize to JSON text.
    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

impl Serialize for ManifestDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ManifestDocument::Degenerate => serializer.serialize_map(Some(0))?.end(),
            ManifestDocument::Manifest(manifest) => manifest.serialize(serializer),
        }
    }
}

/// Strip the final path segment (the manifest file name) from a request URL.
///
/// Query strings and fragments are dropped first.
///
/// ```text
/// https://x/node/1/manifest.json?v=2  →  https://x/node/1
/// ```
pub fn base_id(request_url: &str) -> &str {
    let without_query = request_url
        .split(['?', '#'])
        .next()
        .unwrap_or(request_url);
    match without_query.rsplit_once('/') {
        Some((base, _)) if !base.ends_with('/') && !base.is_empty() => base,
        _ => without_query,
    }
}

/// Content path of a base id, percent-decoded: `https://x/my%20book` → `/my book`.
pub fn content_path(base_id: &str) -> Result<String, ResolveError> {
    let invalid = || ResolveError::InvalidPath(base_id.to_string());
    let url = url::Url::parse(base_id).map_err(|_| invalid())?;
    let path = percent_encoding::percent_decode_str(url.path())
        .decode_utf8()
        .map_err(|_| invalid())?;
    Ok(path.into_owned())
}

/// Build the manifest for `rows`.
pub fn assemble(
    request: ManifestRequest<'_>,
    rows: &[Row<'_>],
    config: &ManifestConfig,
    sources: &Sources<'_>,
) -> ManifestDocument {
    if config.image_server().is_none() {
        tracing::info!("no image server configured, returning empty manifest");
        return ManifestDocument::Degenerate;
    }

    let base = base_id(request.url);
    let entity = resolve_entity(base, sources.resolver);
    let entity = entity.as_deref();

    let metadata = match entity {
        Some(entity) => build_metadata(entity, &config.metadata, sources.resolver, &config.language),
        None => Vec::new(),
    };

    let label = resolve(&[request.view_title, entity.and_then(|e| e.title())])
        .unwrap_or_else(|| config.fallback_label.clone());

    let items = build_items(base, rows, entity, config, sources);
    tracing::info!(id = request.url, canvases = items.len(), "manifest assembled");

    ManifestDocument::Manifest(Box::new(Manifest {
        context: PRESENTATION_CONTEXT.to_string(),
        id: request.url.to_string(),
        kind: "Manifest".to_string(),
        label: crate::types::LangMap::single(&config.language, label),
        required_statement: MetadataEntry::new(
            &config.language,
            &config.attribution_label,
            &config.attribution,
        ),
        metadata,
        items,
    }))
}

fn resolve_entity<'r>(base: &str, resolver: &'r dyn EntityResolver) -> Option<Row<'r>> {
    let resolved = content_path(base).and_then(|path| resolver.resolve_path(&path));
    match resolved {
        Ok(entity) => Some(entity),
        Err(e) => {
            tracing::warn!(base_id = base, error = %e, "manifest entity not resolved");
            None
        }
    }
}

fn build_items(
    base: &str,
    rows: &[Row<'_>],
    entity: Option<&dyn Entity>,
    config: &ManifestConfig,
    sources: &Sources<'_>,
) -> Vec<Canvas> {
    let mut items = Vec::new();
    let mut per_entity: HashMap<String, usize> = HashMap::new();

    for row in rows {
        for field in &config.tile_fields {
            if !row.has_field(field) {
                tracing::debug!(row = row.id(), field = %field, "tile field absent on row");
                continue;
            }
            for attachment in row.attachments(field) {
                let seen = per_entity.entry(row.id().to_string()).or_insert(0);
                *seen += 1;
                let item_id = canvas_id(base, row.id(), *seen);

                let dims = sources.dimensions.resolve(&attachment);
                items.push(build_canvas(
                    &attachment,
                    dims,
                    &item_id,
                    entity,
                    sources.transcripts,
                    &config.language,
                ));
            }
        }
    }

    items
}

/// Canvas id for the `nth` (1-based) attachment an entity contributes.
pub fn canvas_id(base: &str, entity_id: &str, nth: usize) -> String {
    if nth <= 1 {
        format!("{base}/item/{entity_id}")
    } else {
        format!("{base}/item/{entity_id}/{nth}")
    }
}
