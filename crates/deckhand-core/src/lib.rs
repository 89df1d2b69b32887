//! # deckhand-core
//!
//! Core types and traits for the deckhand presentation pipeline.
//!
//! This crate provides the foundational abstractions used throughout deckhand:
//!
//! - **Source identity**: [`PresentationSource`], [`SourceKind`], [`SlideSelector`]
//! - **Metadata**: [`MetadataConfig`] / [`MetadataRecord`] property gating
//! - **Per-slide outcomes**: [`PageRender`], [`SlideText`], [`SlideRecord`]
//! - **Descriptions**: [`DescribeRequest`] / [`Description`] request-result pairs
//! - **Capability seams**: [`DocumentConverter`], [`PageRenderer`], [`DeckReader`],
//!   [`DescriptionModel`]
//!
//! ## Architecture
//!
//! The crate is organized around a pipeline pattern:
//!
//! ```text
//! File → MetadataExtractor ┐
//!      → SlideRasterizer   ├→ PresentationResult → Describer → JSON artifact
//!      → SlideTextExtractor┘
//! ```
//!
//! Document-level failures abort the operation; slide-level and request-level
//! failures are captured in the corresponding record and the operation
//! completes with partial results.
//!
//! ## Related Crates
//!
//! - `deckhand-extract`: Metadata and slide text extraction, PPTX deck reader
//! - `deckhand-raster`: Document conversion and page rasterization
//! - `deckhand-describe`: Gemini client and description fan-out
//! - `deckhand-pipeline`: Content identity and the presentation assembler

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    ConfigError, ConvertError, DescribeError, Error, RenderError, Result, SourceError, TextError,
};
pub use traits::*;
pub use types::*;
