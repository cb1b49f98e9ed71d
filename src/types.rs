//! IIIF Presentation 3 resource types.
//!
//! These are the shapes written to the manifest JSON. Only the subset of the
//! Presentation API this crate emits is modelled: a manifest holding canvases,
//! each canvas holding one painting page and optionally one commenting page.
//!
//! ```text
//! Manifest
//! └── items: Canvas
//!     ├── items: AnnotationPage (painting)
//!     │   └── Annotation → Image body
//!     └── annotations: AnnotationPage (commenting, optional)
//!         └── Annotation → TextualBody
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// JSON-LD context for Presentation API 3.
pub const PRESENTATION_CONTEXT: &str = "http://iiif.io/api/presentation/3/context.json";

/// Language map: language code → ordered list of strings.
///
/// `{"en": ["Book of Hours"]}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LangMap(pub BTreeMap<String, Vec<String>>);

impl LangMap {
    /// A map holding exactly one value under one language.
    pub fn single(language: &str, value: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(language.to_string(), vec![value.into()]);
        Self(map)
    }

    /// First value recorded for `language`.
    pub fn first(&self, language: &str) -> Option<&str> {
        self.0
            .get(language)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// Label/value pair, used for both `metadata` entries and `requiredStatement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub label: LangMap,
    pub value: LangMap,
}

impl MetadataEntry {
    pub fn new(language: &str, label: &str, value: &str) -> Self {
        Self {
            label: LangMap::single(language, label),
            value: LangMap::single(language, value),
        }
    }
}

/// Top-level manifest document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "@context")]
    pub context: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub label: LangMap,
    #[serde(rename = "requiredStatement")]
    pub required_statement: MetadataEntry,
    pub metadata: Vec<MetadataEntry>,
    pub items: Vec<Canvas>,
}

/// One page or view of the object.
///
/// `width` and `height` are 0 when no resolution tier could determine them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub width: u32,
    pub height: u32,
    pub items: Vec<AnnotationPage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationPage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationPage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub items: Vec<Annotation>,
}

impl AnnotationPage {
    pub fn new(id: String, items: Vec<Annotation>) -> Self {
        Self {
            id,
            kind: "AnnotationPage".to_string(),
            items,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Motivation {
    /// The body is the content of the canvas (the image itself).
    Painting,
    /// The body is commentary on the canvas (transcripts).
    Commenting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub motivation: Motivation,
    pub body: Body,
    pub target: String,
}

/// Annotation body, tagged by its IIIF `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Body {
    Image {
        id: String,
        format: String,
        width: u32,
        height: u32,
    },
    TextualBody {
        language: String,
        format: String,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lang_map_serializes_as_plain_object() {
        let map = LangMap::single("en", "Book of Hours");
        assert_eq!(
            serde_json::to_value(&map).unwrap(),
            json!({"en": ["Book of Hours"]})
        );
        assert_eq!(map.first("en"), Some("Book of Hours"));
        assert_eq!(map.first("fr"), None);
    }

    #[test]
    fn canvas_omits_empty_annotations() {
        let canvas = Canvas {
            id: "https://x/item/1".into(),
            kind: "Canvas".into(),
            width: 0,
            height: 0,
            items: vec![],
            annotations: vec![],
        };
        let value = serde_json::to_value(&canvas).unwrap();
        assert!(value.get("annotations").is_none());
        assert_eq!(value["type"], "Canvas");
    }

    #[test]
    fn body_carries_iiif_type_tag() {
        let image = Body::Image {
            id: "https://x/a.jpg".into(),
            format: "image/jpeg".into(),
            width: 10,
            height: 20,
        };
        let value = serde_json::to_value(&image).unwrap();
        assert_eq!(value["type"], "Image");
        assert_eq!(value["format"], "image/jpeg");

        let text = Body::TextualBody {
            language: "en".into(),
            format: "text/plain".into(),
            value: "Lorem".into(),
        };
        let value = serde_json::to_value(&text).unwrap();
        assert_eq!(value["type"], "TextualBody");
        assert_eq!(value["value"], "Lorem");
    }

    #[test]
    fn motivation_is_lowercase() {
        assert_eq!(
            serde_json::to_value(Motivation::Painting).unwrap(),
            json!("painting")
        );
        assert_eq!(
            serde_json::to_value(Motivation::Commenting).unwrap(),
            json!("commenting")
        );
    }

    #[test]
    fn manifest_uses_json_ld_key_names() {
        let manifest = Manifest {
            context: PRESENTATION_CONTEXT.into(),
            id: "https://x/node/1/manifest.json".into(),
            kind: "Manifest".into(),
            label: LangMap::single("en", "Book"),
            required_statement: MetadataEntry::new("en", "Attribution", "Library"),
            metadata: vec![],
            items: vec![],
        };
        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(value["@context"], PRESENTATION_CONTEXT);
        assert_eq!(value["requiredStatement"]["value"]["en"][0], "Library");
        assert!(value.get("required_statement").is_none());
    }
}
