//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every canvas leads
//! with its positional index and what the viewer will see (size and format),
//! with the file URL shown as secondary context on an indented `Source:`
//! line. The manifest JSON itself goes to stdout or a file; these lines go to
//! stderr, so piping the JSON stays clean.
//!
//! # Output Format
//!
//! ## Manifest
//!
//! ```text
//! Book of Hours (2 canvases)
//! 001 640x480 image/jpeg
//!     Source: https://x/sites/default/files/p1.jpg
//!     Transcripts: 2
//! 002 0x0 image/tiff
//!     Source: https://x/sites/default/files/p2.tif
//! ```
//!
//! ## Check
//!
//! ```text
//! Entities
//! 001 Book of Hours (node/1)
//!     Path: /node/1
//!     field_images: 2 files
//! 002 Manuscripts (taxonomy_term/7)
//!
//! Rows
//! 001 1
//! 002 9 (missing)
//!
//! Media
//!     extracted_text: 2
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stderr. Format
//! functions are pure: no I/O, no side effects.

use crate::content::{ContentStore, EntityRecord, FieldItem};
use crate::manifest::ManifestDocument;
use crate::types::{Body, Canvas};
use std::collections::BTreeMap;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Format a canvas line: positional index, size and image format.
///
/// ```text
/// 001 640x480 image/jpeg
/// ```
fn canvas_line(index: usize, canvas: &Canvas) -> String {
    let format = canvas
        .items
        .first()
        .and_then(|page| page.items.first())
        .map(|anno| match &anno.body {
            Body::Image { format, .. } => format.as_str(),
            Body::TextualBody { format, .. } => format.as_str(),
        })
        .unwrap_or("-");
    format!(
        "{} {}x{} {}",
        format_index(index),
        canvas.width,
        canvas.height,
        format
    )
}

fn canvas_source(canvas: &Canvas) -> Option<&str> {
    canvas
        .items
        .first()
        .and_then(|page| page.items.first())
        .and_then(|anno| match &anno.body {
            Body::Image { id, .. } => Some(id.as_str()),
            Body::TextualBody { .. } => None,
        })
}

// ============================================================================
// Manifest output
// ============================================================================

/// Format the canvas inventory of an assembled manifest.
pub fn format_manifest(doc: &ManifestDocument, language: &str) -> Vec<String> {
    let Some(manifest) = doc.manifest() else {
        return vec!["Empty manifest (no image server configured)".to_string()];
    };

    let mut lines = Vec::new();
    let label = manifest.label.first(language).unwrap_or(&manifest.id);
    lines.push(format!(
        "{} ({})",
        label,
        plural(manifest.items.len(), "canvas", "canvases")
    ));

    for (i, canvas) in manifest.items.iter().enumerate() {
        lines.push(canvas_line(i + 1, canvas));
        if let Some(source) = canvas_source(canvas) {
            lines.push(format!("{}Source: {}", indent(1), source));
        }
        let transcripts: usize = canvas.annotations.iter().map(|p| p.items.len()).sum();
        if transcripts > 0 {
            lines.push(format!("{}Transcripts: {}", indent(1), transcripts));
        }
    }

    lines
}

/// Print manifest output to stderr.
pub fn print_manifest(doc: &ManifestDocument, language: &str) {
    for line in format_manifest(doc, language) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

fn entity_header(index: usize, record: &EntityRecord) -> String {
    let title = record.title.as_deref().unwrap_or("(untitled)");
    format!(
        "{} {} ({}/{})",
        format_index(index),
        title,
        record.entity_type,
        record.id
    )
}

/// Format the content store inventory: entities, result rows and media.
pub fn format_store(store: &ContentStore) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Entities".to_string());
    for (i, record) in store.entities.iter().enumerate() {
        lines.push(entity_header(i + 1, record));
        if let Some(path) = &record.path {
            lines.push(format!("{}Path: {}", indent(1), path));
        }
        for (field, items) in &record.fields {
            let files = items
                .iter()
                .filter(|item| matches!(item, FieldItem::File(_)))
                .count();
            if files > 0 {
                lines.push(format!(
                    "{}{}: {}",
                    indent(1),
                    field,
                    plural(files, "file", "files")
                ));
            }
        }
    }

    lines.push(String::new());
    lines.push("Rows".to_string());
    let missing = store.missing_rows(&store.rows);
    for (i, id) in store.rows.iter().enumerate() {
        let marker = if missing.contains(&id.as_str()) {
            " (missing)"
        } else {
            ""
        };
        lines.push(format!("{} {}{}", format_index(i + 1), id, marker));
    }

    if !store.media.is_empty() {
        let mut kinds: BTreeMap<&str, usize> = BTreeMap::new();
        for media in &store.media {
            *kinds.entry(media.kind.as_str()).or_default() += 1;
        }
        lines.push(String::new());
        lines.push("Media".to_string());
        for (kind, count) in kinds {
            lines.push(format!("{}{}: {}", indent(1), kind, count));
        }
    }

    lines
}

/// Print store inventory to stderr.
pub fn print_store(store: &ContentStore) {
    for line in format_store(store) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
