//! Slide rasterizer.
//!
//! Produces one image file per selected slide index. PDFs are rendered page
//! by page; native decks are first converted to PDF as a whole document via
//! the [`DocumentConverter`] capability. A single page failing to render is
//! isolated to its index; a failed conversion is fatal for the call.

use deckhand_core::{
    DocumentConverter, Error, ImageFormat, ImageSize, PageRender, PageRenderer, RenderError,
    SourceKind,
};
use image::imageops::FilterType;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Scratch directory name for the deck-to-PDF conversion artifact.
const CONVERT_SCRATCH_DIR: &str = ".convert";

/// Rasterizes selected slides into a caller-supplied output directory.
pub struct SlideRasterizer {
    converter: Arc<dyn DocumentConverter>,
    renderer: Arc<dyn PageRenderer>,
}

impl SlideRasterizer {
    /// Create a rasterizer over the given conversion and rendering capabilities.
    #[must_use]
    pub fn new(converter: Arc<dyn DocumentConverter>, renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            converter,
            renderer,
        }
    }

    /// Rasterize the selected slide indices of `source` into `out_dir`.
    ///
    /// Returns one [`PageRender`] per requested index, in selector order.
    /// Images are written as `slide_NNN.<ext>`, so repeated runs with the
    /// same selector reproduce the same file names. When `resize` is given,
    /// every image is stretched to exactly that size.
    pub async fn rasterize(
        &self,
        source: &Path,
        kind: SourceKind,
        indices: &[u32],
        format: ImageFormat,
        resize: Option<ImageSize>,
        out_dir: &Path,
    ) -> Result<Vec<PageRender>, Error> {
        tokio::fs::create_dir_all(out_dir).await?;

        let scratch = out_dir.join(CONVERT_SCRATCH_DIR);
        let pdf = match kind {
            SourceKind::Pdf => source.to_path_buf(),
            SourceKind::Deck => {
                tokio::fs::create_dir_all(&scratch).await?;
                match self.converter.convert(source, "pdf", &scratch).await {
                    Ok(pdf) => pdf,
                    Err(e) => {
                        let _ = tokio::fs::remove_dir_all(&scratch).await;
                        return Err(e.into());
                    }
                }
            }
        };

        let mut pages = Vec::with_capacity(indices.len());
        for &index in indices {
            let image = self
                .render_one(&pdf, index, format, resize, out_dir)
                .await;
            if let Err(ref e) = image {
                warn!("Slide {} rasterization failed: {}", index, e);
            }
            pages.push(PageRender { index, image });
        }

        if kind == SourceKind::Deck {
            // The intermediate PDF is no longer needed
            let _ = tokio::fs::remove_dir_all(&scratch).await;
        }

        let rendered = pages.iter().filter(|p| p.image.is_ok()).count();
        info!(
            "Rasterized {}/{} slides of {:?} into {:?}",
            rendered,
            indices.len(),
            source,
            out_dir
        );
        Ok(pages)
    }

    async fn render_one(
        &self,
        pdf: &Path,
        index: u32,
        format: ImageFormat,
        resize: Option<ImageSize>,
        out_dir: &Path,
    ) -> Result<PathBuf, RenderError> {
        let bytes = self.renderer.render_page(pdf, index, format).await?;

        let encoded = match resize {
            Some(size) => {
                tokio::task::spawn_blocking(move || resize_image(bytes, index, format, size))
                    .await
                    .map_err(|e| RenderError::Failed {
                        page: index,
                        reason: format!("resize task failed: {e}"),
                    })??
            }
            None => bytes,
        };

        let target = out_dir.join(format!("slide_{index:03}.{}", format.extension()));
        tokio::fs::write(&target, encoded)
            .await
            .map_err(|e| RenderError::Write {
                path: target.clone(),
                source: e,
            })?;

        debug!("Wrote {:?}", target);
        Ok(target)
    }
}

/// Stretch an encoded image to exactly `size` and re-encode it.
fn resize_image(
    bytes: Vec<u8>,
    page: u32,
    format: ImageFormat,
    size: ImageSize,
) -> Result<Vec<u8>, RenderError> {
    let decoded = image::load_from_memory(&bytes).map_err(|e| RenderError::Decode {
        page,
        reason: e.to_string(),
    })?;

    let resized = decoded.resize_exact(size.width, size.height, FilterType::Lanczos3);

    let target_format = match format {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
    };
    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, target_format)
        .map_err(|e| RenderError::Decode {
            page,
            reason: format!("re-encode failed: {e}"),
        })?;
    Ok(out.into_inner())
}
