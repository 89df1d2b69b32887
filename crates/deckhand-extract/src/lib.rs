//! # deckhand-extract
//!
//! Metadata and slide text extraction for the deckhand pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MetadataExtractor`] | Config-gated document properties for PDFs and decks |
//! | [`SlideTextExtractor`] | Per-slide text with per-index failure isolation |
//! | [`PptxDeckReader`] | Thin [`DeckReader`](deckhand_core::DeckReader) over the PPTX container |
//!
//! PDFs are handled in-process (lopdf for properties, pdf-extract for the
//! text layer); native decks are reached through the `DeckReader` capability
//! so tests can substitute a mock.

pub mod metadata;
pub mod pptx;
pub mod text;

pub use metadata::{pdf_page_count, MetadataExtractor};
pub use pptx::PptxDeckReader;
pub use text::SlideTextExtractor;
