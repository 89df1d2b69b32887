//! Capability traits for deckhand collaborators.
//!
//! This module defines the seams between the pipeline and its external
//! collaborators:
//!
//! - [`DocumentConverter`]: Whole-document format conversion (external process)
//! - [`PageRenderer`]: Rasterize one PDF page to encoded image bytes
//! - [`DeckReader`]: Read slide count, per-slide text, and properties of a native deck
//! - [`DescriptionModel`]: Turn an image and a prompt into generated text
//!
//! These traits enable a pluggable architecture where the real subprocess and
//! network implementations can be swapped for mocks in tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, DescribeError, RenderError, SourceError, TextError};
use crate::types::{DeckProperties, ImageFormat, ImagePayload};

// ============================================================================
// Document conversion
// ============================================================================

/// Trait for whole-document format conversion.
///
/// Implementations invoke an external converter process and must be bounded
/// by a timeout; there is no per-slide granularity at this stage.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Convert `src` to `target_format`, writing into `out_dir`.
    ///
    /// Returns the path of the converted file. Non-zero exit, timeout, and
    /// missing output all surface as [`ConvertError`].
    async fn convert(
        &self,
        src: &Path,
        target_format: &str,
        out_dir: &Path,
    ) -> Result<PathBuf, ConvertError>;
}

// ============================================================================
// Page rendering
// ============================================================================

/// Trait for rasterizing a single PDF page.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Render the 1-based `page` of `doc` and return the encoded image bytes.
    async fn render_page(
        &self,
        doc: &Path,
        page: u32,
        format: ImageFormat,
    ) -> Result<Vec<u8>, RenderError>;
}

// ============================================================================
// Deck reading
// ============================================================================

/// Trait for reading a native slide deck.
///
/// Implementations are stateless services keyed by path, like the rest of the
/// pipeline; per-call re-opening keeps the trait object shareable.
#[async_trait]
pub trait DeckReader: Send + Sync {
    /// Number of slides in the deck.
    async fn slide_count(&self, deck: &Path) -> Result<u32, SourceError>;

    /// Text content of the 1-based `index` slide, shapes concatenated in
    /// document order. A slide without text yields an empty string.
    async fn slide_text(&self, deck: &Path, index: u32) -> Result<String, TextError>;

    /// Document properties of the deck.
    async fn properties(&self, deck: &Path) -> Result<DeckProperties, SourceError>;
}

// ============================================================================
// Description generation
// ============================================================================

/// Trait for the external generative model.
#[async_trait]
pub trait DescriptionModel: Send + Sync {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    /// Stage image bytes via the backend's upload surface and return a
    /// handle URI usable in a subsequent [`generate`](Self::generate) call.
    async fn stage(&self, data: Vec<u8>, mime_type: &str) -> Result<String, DescribeError>;

    /// Generate a description for the image under the given prompt.
    async fn generate(
        &self,
        payload: &ImagePayload,
        prompt: &str,
        model: &str,
    ) -> Result<String, DescribeError>;
}
