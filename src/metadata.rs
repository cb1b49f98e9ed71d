//! Descriptive metadata for the manifest.
//!
//! The manifest's `metadata` list is driven by a fixed, ordered table of
//! `label → field` mappings from config:
//!
//! ```toml
//! [[metadata]]
//! label = "Creator"
//! field = "field_creator"
//! ```
//!
//! ## Resolution
//!
//! For each mapping, in table order:
//!
//! - **Missing field**: skipped.
//! - **Reference field** (the first item points at another entity, e.g. a
//!   taxonomy term): the referenced entity is loaded and its display name
//!   (`name` field, then title) is used.
//! - **Plain field**: the first raw value is used verbatim.
//!
//! A mapping whose resolved value is empty produces no entry, so the output
//! order always follows the table and never the entity's own field order.

use crate::config::MetadataMapping;
use crate::source::{Entity, EntityResolver};
use crate::types::MetadataEntry;

/// Resolve a value from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value, trimmed.
///
/// ```text
/// label:     resolve(&[view_title, entity_title])
/// reference: resolve(&[term_name, term_title])
/// ```
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Build the metadata entries for `entity`.
pub fn build_metadata(
    entity: &dyn Entity,
    mappings: &[MetadataMapping],
    resolver: &dyn EntityResolver,
    language: &str,
) -> Vec<MetadataEntry> {
    mappings
        .iter()
        .filter_map(|mapping| {
            let value = field_display_value(entity, &mapping.field, resolver)?;
            Some(MetadataEntry::new(language, &mapping.label, &value))
        })
        .collect()
}

/// Display string for one field: reference targets resolve to their name.
pub fn field_display_value(
    entity: &dyn Entity,
    field: &str,
    resolver: &dyn EntityResolver,
) -> Option<String> {
    if !entity.has_field(field) {
        tracing::debug!(entity = entity.id(), field, "metadata field absent");
        return None;
    }

    match entity.reference_target(field) {
        Some(target) => {
            let Some(referenced) = resolver.load(&target) else {
                tracing::warn!(
                    entity = entity.id(),
                    field,
                    target_type = %target.entity_type,
                    target_id = %target.id,
                    "referenced entity not found"
                );
                return None;
            };
            let name = referenced.field_value("name");
            resolve(&[name.as_deref(), referenced.title()])
        }
        None => entity
            .field_value(field)
            .filter(|raw| !raw.trim().is_empty()),
    }
}
