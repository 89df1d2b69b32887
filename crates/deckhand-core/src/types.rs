//! Core types for deckhand.
//!
//! This module contains all shared data structures used across deckhand:
//!
//! ## Sources
//! - [`PresentationSource`]: Identity of an input file
//! - [`SourceKind`]: Native deck vs. rendered PDF
//! - [`SlideSelector`]: Which slides a caller wants processed
//!
//! ## Metadata
//! - [`MetadataConfig`]: Which document properties to extract
//! - [`MetadataRecord`]: The extracted properties
//! - [`DeckProperties`]: Raw properties surfaced by a [`DeckReader`](crate::traits::DeckReader)
//!
//! ## Slides
//! - [`SlideRecord`]: Per-slide image path, text, description, error
//! - [`PresentationResult`]: The persisted unit
//! - [`PageRender`] / [`SlideText`]: Per-index stage outcomes
//!
//! ## Descriptions
//! - [`DescribeRequest`]: One (image, prompt) pair
//! - [`Description`]: Tagged per-request outcome
//! - [`ImagePayload`]: Inline bytes vs. uploaded handle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ConfigError, RenderError, TextError};

// ============================================================================
// Sources
// ============================================================================

/// Kind of a presentation source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Native editable slide deck (PPTX container)
    Deck,
    /// Rendered PDF
    Pdf,
}

impl SourceKind {
    /// Map a lowercase file extension to a kind, if recognized.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pptx" => Some(Self::Deck),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Immutable identity of an input presentation file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationSource {
    /// Path the pipeline was started with
    pub path: PathBuf,
    /// Detected source kind
    pub kind: SourceKind,
    /// File size in bytes
    pub size_bytes: u64,
    /// Content digest (blake3, hex)
    pub digest: String,
}

/// Which slides a caller wants processed.
///
/// Indices are 1-based. `resolve` validates an explicit selection against the
/// document's slide count, de-duplicates, and sorts ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SlideSelector {
    /// Every slide in the document
    #[default]
    All,
    /// An explicit set of 1-based indices
    Indices(Vec<u32>),
}

impl SlideSelector {
    /// Resolve the selector to a sorted, de-duplicated index list.
    ///
    /// An out-of-range index (0, or greater than `slide_count`) is rejected
    /// before any work starts. An empty explicit selection is rejected too.
    pub fn resolve(&self, slide_count: u32) -> std::result::Result<Vec<u32>, ConfigError> {
        match self {
            Self::All => Ok((1..=slide_count).collect()),
            Self::Indices(indices) => {
                if indices.is_empty() {
                    return Err(ConfigError::EmptySelection);
                }
                let mut resolved: Vec<u32> = Vec::with_capacity(indices.len());
                for &index in indices {
                    if index == 0 || index > slide_count {
                        return Err(ConfigError::SlideOutOfRange {
                            index,
                            count: slide_count,
                        });
                    }
                    resolved.push(index);
                }
                resolved.sort_unstable();
                resolved.dedup();
                Ok(resolved)
            }
        }
    }
}

// ============================================================================
// Images
// ============================================================================

/// Output image encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageFormat {
    /// File extension without the leading dot.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// MIME type of the encoding.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// Target pixel dimensions for slide images.
///
/// Applied as an exact stretch: output images are always exactly
/// `width`×`height`, aspect ratio not preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl FromStr for ImageSize {
    type Err = ConfigError;

    /// Parse a `WIDTHxHEIGHT` spec such as `1024x768`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidSize(s.to_string());
        let (w, h) = s.split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Which document properties to extract.
///
/// A fixed set of named switches rather than an open map, so an unsupported
/// key is a type error instead of being silently ignored. Keys that do not
/// apply to the detected source kind are skipped: `language` and
/// `last_printed` are deck-only, `encrypted` and `pdf_version` are PDF-only.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default)]
    pub title: bool,
    #[serde(default)]
    pub author: bool,
    #[serde(default)]
    pub subject: bool,
    #[serde(default)]
    pub created: bool,
    #[serde(default)]
    pub modified: bool,
    #[serde(default)]
    pub slide_count: bool,
    #[serde(default)]
    pub language: bool,
    #[serde(default)]
    pub last_printed: bool,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default)]
    pub pdf_version: bool,
}

impl MetadataConfig {
    /// Enable every property.
    #[must_use]
    pub fn all() -> Self {
        Self {
            title: true,
            author: true,
            subject: true,
            created: true,
            modified: true,
            slide_count: true,
            language: true,
            last_printed: true,
            encrypted: true,
            pdf_version: true,
        }
    }
}

/// Extracted document properties.
///
/// Every field is optional; a key that was not requested, does not apply to
/// the source kind, or is absent from the document is omitted from the JSON
/// output entirely (never serialized as null).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_printed: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_version: Option<String>,
}

/// Raw properties surfaced by a deck reader, before config gating.
#[derive(Debug, Clone, Default)]
pub struct DeckProperties {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub last_printed: Option<DateTime<Utc>>,
    pub language: Option<String>,
    pub slide_count: Option<u32>,
}

// ============================================================================
// Per-index stage outcomes
// ============================================================================

/// Outcome of rendering one slide index.
#[derive(Debug)]
pub struct PageRender {
    /// 1-based slide index
    pub index: u32,
    /// Written image path, or why this index failed
    pub image: std::result::Result<PathBuf, RenderError>,
}

/// Outcome of extracting one slide's text.
#[derive(Debug)]
pub struct SlideText {
    /// 1-based slide index
    pub index: u32,
    /// Extracted text (possibly empty), or why this index failed
    pub text: std::result::Result<String, TextError>,
}

// ============================================================================
// Assembled result
// ============================================================================

/// One slide of the assembled presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideRecord {
    /// 1-based slide index
    pub index: u32,
    /// Rasterized image location (null if the render failed)
    pub image_path: Option<PathBuf>,
    /// Extracted slide text (empty if the slide has none or was unreadable)
    pub text: String,
    /// AI-generated description, once merged in
    #[serde(rename = "generated_description")]
    pub description: Option<String>,
    /// Stage failures recorded for this index
    pub error: Option<String>,
}

/// The persisted unit: source identity, metadata, and ordered slides.
///
/// Invariant: `slides` is strictly ascending by unique index and its length
/// equals the size of the resolved selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentationResult {
    pub source: PresentationSource,
    #[serde(rename = "presentation")]
    pub metadata: MetadataRecord,
    pub slides: Vec<SlideRecord>,
}

impl PresentationResult {
    /// Merge per-slide description outcomes back into the slide records.
    ///
    /// A failed description lands in the slide's `error` field, appended to
    /// any error already recorded for that index.
    pub fn apply_descriptions<I>(&mut self, outcomes: I)
    where
        I: IntoIterator<Item = (u32, Description)>,
    {
        for (index, outcome) in outcomes {
            let Some(slide) = self.slides.iter_mut().find(|s| s.index == index) else {
                continue;
            };
            match outcome {
                Description::Generated(text) => slide.description = Some(text),
                Description::Failed(cause) => {
                    slide.error = Some(match slide.error.take() {
                        Some(prev) => format!("{prev}; {cause}"),
                        None => cause,
                    });
                }
            }
        }
    }
}

// ============================================================================
// Descriptions
// ============================================================================

/// One description request: an image and the prompt to apply to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeRequest {
    pub image_path: PathBuf,
    pub prompt: String,
}

/// Tagged outcome of one description request.
///
/// Batch output is always 1:1 and order-preserving with the request list;
/// this enum is the per-item success/failure carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Description {
    /// The model produced a description
    Generated(String),
    /// The request failed; human-readable cause
    Failed(String),
}

impl Description {
    /// Generated text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Generated(text) => Some(text),
            Self::Failed(_) => None,
        }
    }

    /// Failure cause, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Generated(_) => None,
            Self::Failed(cause) => Some(cause),
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// How a slide image travels to the model.
#[derive(Debug, Clone)]
pub enum ImagePayload {
    /// Raw bytes sent inline with the request
    Inline { data: Vec<u8>, mime_type: String },
    /// Handle to a previously staged upload
    Handle { uri: String, mime_type: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== SourceKind Tests ====================

    #[test]
    fn test_source_kind_from_extension() {
        assert_eq!(SourceKind::from_extension("pptx"), Some(SourceKind::Deck));
        assert_eq!(SourceKind::from_extension("PPTX"), Some(SourceKind::Deck));
        assert_eq!(SourceKind::from_extension("pdf"), Some(SourceKind::Pdf));
        assert_eq!(SourceKind::from_extension("docx"), None);
    }

    #[test]
    fn test_source_kind_serialization() {
        assert_eq!(serde_json::to_string(&SourceKind::Deck).unwrap(), "\"deck\"");
        assert_eq!(serde_json::to_string(&SourceKind::Pdf).unwrap(), "\"pdf\"");
    }

    // ==================== SlideSelector Tests ====================

    #[test]
    fn test_selector_all_resolves_to_full_range() {
        let resolved = SlideSelector::All.resolve(4).unwrap();
        assert_eq!(resolved, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_selector_indices_sorted_and_deduped() {
        let selector = SlideSelector::Indices(vec![3, 1, 3, 2]);
        let resolved = selector.resolve(5).unwrap();
        assert_eq!(resolved, vec![1, 2, 3]);
    }

    #[test]
    fn test_selector_rejects_out_of_range() {
        let selector = SlideSelector::Indices(vec![1, 9]);
        let err = selector.resolve(4).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::SlideOutOfRange { index: 9, count: 4 }
        ));
    }

    #[test]
    fn test_selector_rejects_zero_index() {
        let selector = SlideSelector::Indices(vec![0]);
        assert!(selector.resolve(4).is_err());
    }

    #[test]
    fn test_selector_rejects_empty_selection() {
        let selector = SlideSelector::Indices(vec![]);
        assert!(matches!(
            selector.resolve(4).unwrap_err(),
            ConfigError::EmptySelection
        ));
    }

    #[test]
    fn test_selector_default_is_all() {
        assert_eq!(SlideSelector::default(), SlideSelector::All);
    }

    // ==================== ImageFormat Tests ====================

    #[test]
    fn test_image_format_extension() {
        assert_eq!(ImageFormat::Png.extension(), "png");
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
    }

    #[test]
    fn test_image_format_mime_type() {
        assert_eq!(ImageFormat::Png.mime_type(), "image/png");
        assert_eq!(ImageFormat::Jpeg.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_image_format_serialization() {
        assert_eq!(serde_json::to_string(&ImageFormat::Png).unwrap(), "\"png\"");
        assert_eq!(
            serde_json::to_string(&ImageFormat::Jpeg).unwrap(),
            "\"jpeg\""
        );
    }

    // ==================== ImageSize Tests ====================

    #[test]
    fn test_image_size_parse() {
        let size: ImageSize = "1024x768".parse().unwrap();
        assert_eq!(
            size,
            ImageSize {
                width: 1024,
                height: 768
            }
        );
    }

    #[test]
    fn test_image_size_parse_uppercase_separator() {
        let size: ImageSize = "800X600".parse().unwrap();
        assert_eq!(size.width, 800);
        assert_eq!(size.height, 600);
    }

    #[test]
    fn test_image_size_parse_rejects_garbage() {
        assert!("1024".parse::<ImageSize>().is_err());
        assert!("wxh".parse::<ImageSize>().is_err());
        assert!("0x600".parse::<ImageSize>().is_err());
    }

    // ==================== MetadataConfig Tests ====================

    #[test]
    fn test_metadata_config_default_is_all_off() {
        let config = MetadataConfig::default();
        assert!(!config.title);
        assert!(!config.author);
        assert!(!config.encrypted);
    }

    #[test]
    fn test_metadata_config_all() {
        let config = MetadataConfig::all();
        assert!(config.title);
        assert!(config.language);
        assert!(config.pdf_version);
    }

    #[test]
    fn test_metadata_config_from_partial_toml_like_json() {
        let config: MetadataConfig = serde_json::from_str(r#"{"title": true}"#).unwrap();
        assert!(config.title);
        assert!(!config.author);
    }

    // ==================== MetadataRecord Tests ====================

    #[test]
    fn test_metadata_record_omits_absent_keys() {
        let record = MetadataRecord {
            title: Some("Quarterly Review".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("Quarterly Review"));
        assert!(!json.contains("author"));
        assert!(!json.contains("null"));
    }

    #[test]
    fn test_metadata_record_roundtrip() {
        let record = MetadataRecord {
            title: Some("Deck".to_string()),
            slide_count: Some(12),
            encrypted: Some(false),
            ..Default::default()
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: MetadataRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }

    // ==================== SlideRecord Tests ====================

    #[test]
    fn test_slide_record_serializes_description_field_name() {
        let record = SlideRecord {
            index: 1,
            image_path: Some(PathBuf::from("/out/slide_001.png")),
            text: "Agenda".to_string(),
            description: Some("A title slide".to_string()),
            error: None,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"generated_description\":\"A title slide\""));
        assert!(json.contains("\"error\":null"));
    }

    #[test]
    fn test_slide_record_null_image_path() {
        let record = SlideRecord {
            index: 3,
            image_path: None,
            text: String::new(),
            description: None,
            error: Some("page 3 render failed: boom".to_string()),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"image_path\":null"));
        assert!(json.contains("render failed"));
    }

    // ==================== PresentationResult Tests ====================

    fn sample_result() -> PresentationResult {
        PresentationResult {
            source: PresentationSource {
                path: PathBuf::from("/deck.pptx"),
                kind: SourceKind::Deck,
                size_bytes: 1024,
                digest: "abc123".to_string(),
            },
            metadata: MetadataRecord::default(),
            slides: vec![
                SlideRecord {
                    index: 1,
                    image_path: Some(PathBuf::from("/out/slide_001.png")),
                    text: "one".to_string(),
                    description: None,
                    error: None,
                },
                SlideRecord {
                    index: 2,
                    image_path: Some(PathBuf::from("/out/slide_002.png")),
                    text: "two".to_string(),
                    description: None,
                    error: Some("earlier failure".to_string()),
                },
            ],
        }
    }

    #[test]
    fn test_apply_descriptions_success() {
        let mut result = sample_result();
        result.apply_descriptions(vec![(1, Description::Generated("a chart".to_string()))]);

        assert_eq!(result.slides[0].description.as_deref(), Some("a chart"));
        assert!(result.slides[1].description.is_none());
    }

    #[test]
    fn test_apply_descriptions_failure_appends_error() {
        let mut result = sample_result();
        result.apply_descriptions(vec![(2, Description::Failed("quota exceeded".to_string()))]);

        assert!(result.slides[1].description.is_none());
        assert_eq!(
            result.slides[1].error.as_deref(),
            Some("earlier failure; quota exceeded")
        );
    }

    #[test]
    fn test_apply_descriptions_unknown_index_ignored() {
        let mut result = sample_result();
        result.apply_descriptions(vec![(99, Description::Generated("ghost".to_string()))]);

        assert!(result.slides.iter().all(|s| s.description.is_none()));
    }

    #[test]
    fn test_presentation_result_json_shape() {
        let result = sample_result();
        let json = serde_json::to_value(&result).unwrap();

        assert!(json.get("source").is_some());
        assert!(json.get("presentation").is_some());
        assert_eq!(json["slides"].as_array().unwrap().len(), 2);
    }

    // ==================== Description Tests ====================

    #[test]
    fn test_description_accessors() {
        let ok = Description::Generated("text".to_string());
        assert_eq!(ok.text(), Some("text"));
        assert_eq!(ok.error(), None);
        assert!(!ok.is_failed());

        let failed = Description::Failed("cause".to_string());
        assert_eq!(failed.text(), None);
        assert_eq!(failed.error(), Some("cause"));
        assert!(failed.is_failed());
    }
}
