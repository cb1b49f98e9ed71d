//! Canvas construction and transcript annotation pages.
//!
//! One attachment becomes one canvas:
//!
//! ```text
//! {item}                              Canvas  (width × height)
//! {item}/annopage-1                   AnnotationPage
//! {item}/annopage-1/anno-1            painting → Image body (file url, mime, size)
//! {item}/annopage-2                   AnnotationPage       (only with transcripts)
//! {item}/annopage-2/anno-1            commenting → TextualBody, one per transcript
//! ```
//!
//! Width and height are written to both the canvas and the image body, as the
//! Presentation API expects for a full-canvas painting annotation.

use crate::imaging::Dimensions;
use crate::source::{Attachment, EXTRACTED_TEXT, Entity, TranscriptSource};
use crate::types::{Annotation, AnnotationPage, Body, Canvas, Motivation};

/// Build the canvas for a single attachment.
///
/// `transcript_entity` is the entity whose extracted-text media become the
/// commenting page; `None` means the canvas gets no `annotations`.
pub fn build_canvas(
    attachment: &Attachment,
    dims: Dimensions,
    item_id: &str,
    transcript_entity: Option<&dyn Entity>,
    transcripts: &dyn TranscriptSource,
    language: &str,
) -> Canvas {
    let page_id = format!("{item_id}/annopage-1");
    let painting = Annotation {
        id: format!("{page_id}/anno-1"),
        kind: "Annotation".to_string(),
        motivation: Motivation::Painting,
        body: Body::Image {
            id: attachment.url.clone(),
            format: attachment.mime_type.clone(),
            width: dims.width,
            height: dims.height,
        },
        target: item_id.to_string(),
    };

    let mut canvas = Canvas {
        id: item_id.to_string(),
        kind: "Canvas".to_string(),
        width: dims.width,
        height: dims.height,
        items: vec![AnnotationPage::new(page_id, vec![painting])],
        annotations: Vec::new(),
    };

    if let Some(entity) = transcript_entity {
        let comments = transcript_annotations(entity, item_id, transcripts, language);
        if !comments.is_empty() {
            canvas.annotations.push(AnnotationPage::new(
                format!("{item_id}/annopage-2"),
                comments,
            ));
        }
    }

    canvas
}

/// Commenting annotations for every non-empty extracted-text media of `entity`.
///
/// Annotations come out in discovery order and all target `item_id`.
/// Whitespace-only text counts as empty.
pub fn transcript_annotations(
    entity: &dyn Entity,
    item_id: &str,
    transcripts: &dyn TranscriptSource,
    language: &str,
) -> Vec<Annotation> {
    // TODO: number commenting ids (anno-1, anno-2, …) once consumers keyed on
    // the shared anno-1 id are migrated.
    let annotation_id = format!("{item_id}/annopage-2/anno-1");

    transcripts
        .media_of(entity)
        .into_iter()
        .filter(|media| media.kind == EXTRACTED_TEXT)
        .filter_map(|media| media.text)
        .filter(|text| !text.trim().is_empty())
        .map(|text| Annotation {
            id: annotation_id.clone(),
            kind: "Annotation".to_string(),
            motivation: Motivation::Commenting,
            body: Body::TextualBody {
                language: language.to_string(),
                format: "text/plain".to_string(),
                value: text,
            },
            target: item_id.to_string(),
        })
        .collect()
}
