//! # deckhand-raster
//!
//! Document conversion and slide rasterization for the deckhand pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SofficeConverter`] | Headless LibreOffice subprocess, timeout-bounded |
//! | [`PdftoppmRenderer`] | Per-page poppler subprocess rendering to stdout |
//! | [`SlideRasterizer`] | Drives conversion + rendering, exact-stretch resize, deterministic file names |
//!
//! Native decks are normalized to PDF as a whole document before page
//! rendering; a conversion failure is fatal while a single page's render
//! failure is isolated to its slide index.

pub mod convert;
pub mod render;
pub mod rasterizer;

pub use convert::{SofficeConverter, DEFAULT_CONVERT_TIMEOUT};
pub use render::{PdftoppmRenderer, DEFAULT_RENDER_DPI};
pub use rasterizer::SlideRasterizer;
