//! Presentation assembler.
//!
//! Orchestration only: detect the source kind, resolve the slide selector,
//! drive metadata extraction, rasterization, and text extraction, and zip
//! their per-index outcomes into [`SlideRecord`]s. A requested index is
//! never silently dropped: whatever stages failed for it are recorded in
//! the slide's error field.

use deckhand_core::{
    DeckReader, DocumentConverter, Error, ImageFormat, ImageSize, MetadataConfig, PageRenderer,
    PresentationResult, PresentationSource, SlideRecord, SlideSelector, SourceError, SourceKind,
};
use deckhand_extract::{pdf_page_count, MetadataExtractor, SlideTextExtractor};
use deckhand_raster::SlideRasterizer;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::identity;

/// Options governing one assembly run.
#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    /// Which slides to process
    pub selector: SlideSelector,
    /// Output image encoding
    pub image_format: ImageFormat,
    /// Stretch slide images to exactly this size
    pub resize: Option<ImageSize>,
    /// Which document properties to extract
    pub metadata: MetadataConfig,
}

/// Composes extraction, rasterization, and text into one result.
pub struct Assembler {
    deck: Arc<dyn DeckReader>,
    metadata: MetadataExtractor,
    texts: SlideTextExtractor,
    rasterizer: SlideRasterizer,
}

impl Assembler {
    /// Create an assembler over the given collaborator capabilities.
    #[must_use]
    pub fn new(
        deck: Arc<dyn DeckReader>,
        converter: Arc<dyn DocumentConverter>,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        Self {
            metadata: MetadataExtractor::new(Arc::clone(&deck)),
            texts: SlideTextExtractor::new(Arc::clone(&deck)),
            rasterizer: SlideRasterizer::new(converter, renderer),
            deck,
        }
    }

    /// Assemble a presentation: metadata plus one record per selected slide.
    ///
    /// Writes slide images under `out_dir` (created if absent). Does not
    /// persist the JSON result; that is left to the caller.
    pub async fn assemble(
        &self,
        path: &Path,
        out_dir: &Path,
        options: &AssembleOptions,
    ) -> Result<PresentationResult, Error> {
        let kind = detect_kind(path).await?;
        debug!("Assembling {:?} as {:?}", path, kind);

        let file_meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| SourceError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
        let digest = identity::digest(path).await?;
        let source = PresentationSource {
            path: path.to_path_buf(),
            kind,
            size_bytes: file_meta.len(),
            digest,
        };

        let slide_count = match kind {
            SourceKind::Pdf => pdf_page_count(path).await?,
            SourceKind::Deck => self.deck.slide_count(path).await?,
        };
        let indices = options.selector.resolve(slide_count)?;

        let metadata = self
            .metadata
            .extract(path, kind, &options.metadata)
            .await?;

        let renders = self
            .rasterizer
            .rasterize(
                path,
                kind,
                &indices,
                options.image_format,
                options.resize,
                out_dir,
            )
            .await?;
        let texts = self.texts.extract(path, kind, &indices).await?;

        let mut slides = Vec::with_capacity(indices.len());
        for (render, slide_text) in renders.into_iter().zip(texts) {
            debug_assert_eq!(render.index, slide_text.index);

            let mut errors = Vec::new();
            let image_path = match render.image {
                Ok(image_path) => Some(image_path),
                Err(e) => {
                    errors.push(e.to_string());
                    None
                }
            };
            let text = match slide_text.text {
                Ok(text) => text,
                Err(e) => {
                    errors.push(e.to_string());
                    String::new()
                }
            };

            slides.push(SlideRecord {
                index: render.index,
                image_path,
                text,
                description: None,
                error: (!errors.is_empty()).then(|| errors.join("; ")),
            });
        }

        info!(
            "Assembled {:?}: {} slides, {} with errors",
            path,
            slides.len(),
            slides.iter().filter(|s| s.error.is_some()).count()
        );
        Ok(PresentationResult {
            source,
            metadata,
            slides,
        })
    }
}

/// Detect the source kind from the file extension, falling back to a
/// magic-bytes sniff for files with unhelpful names.
pub async fn detect_kind(path: &Path) -> Result<SourceKind, SourceError> {
    if let Some(kind) = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(SourceKind::from_extension)
    {
        return Ok(kind);
    }

    let mut header = [0u8; 4];
    let n = {
        use tokio::io::AsyncReadExt;
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| SourceError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
        file.read(&mut header).await.map_err(|e| SourceError::Read {
            path: path.to_path_buf(),
            source: e,
        })?
    };

    match &header[..n] {
        [b'%', b'P', b'D', b'F'] => Ok(SourceKind::Pdf),
        [b'P', b'K', 0x03, 0x04] => Ok(SourceKind::Deck),
        _ => Err(SourceError::UnsupportedFormat(
            path.to_string_lossy().into_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use deckhand_core::{
        ConfigError, ConvertError, DeckProperties, RenderError, TextError,
    };
    use std::io::Cursor;
    use std::path::PathBuf;

    // ==================== Mock collaborators ====================

    struct MockDeck {
        slides: u32,
    }

    #[async_trait]
    impl DeckReader for MockDeck {
        async fn slide_count(&self, _deck: &Path) -> Result<u32, SourceError> {
            Ok(self.slides)
        }

        async fn slide_text(&self, _deck: &Path, index: u32) -> Result<String, TextError> {
            Ok(format!("text of slide {index}"))
        }

        async fn properties(&self, _deck: &Path) -> Result<DeckProperties, SourceError> {
            Ok(DeckProperties {
                title: Some("Mock Deck".to_string()),
                slide_count: Some(self.slides),
                ..Default::default()
            })
        }
    }

    struct MockConverter;

    #[async_trait]
    impl DocumentConverter for MockConverter {
        async fn convert(
            &self,
            src: &Path,
            target_format: &str,
            out_dir: &Path,
        ) -> Result<PathBuf, ConvertError> {
            let out = out_dir
                .join(src.file_stem().unwrap_or_default())
                .with_extension(target_format);
            std::fs::write(&out, b"%PDF-stub").unwrap();
            Ok(out)
        }
    }

    struct MockRenderer {
        fail_pages: Vec<u32>,
    }

    #[async_trait]
    impl PageRenderer for MockRenderer {
        async fn render_page(
            &self,
            _doc: &Path,
            page: u32,
            _format: ImageFormat,
        ) -> Result<Vec<u8>, RenderError> {
            if self.fail_pages.contains(&page) {
                return Err(RenderError::Failed {
                    page,
                    reason: "scripted failure".to_string(),
                });
            }
            Ok(test_png())
        }
    }

    fn test_png() -> Vec<u8> {
        use image::{ImageBuffer, Rgb};

        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_fn(32, 24, |_, _| Rgb([200, 200, 200]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn assembler(slides: u32, fail_pages: &[u32]) -> Assembler {
        Assembler::new(
            Arc::new(MockDeck { slides }),
            Arc::new(MockConverter),
            Arc::new(MockRenderer {
                fail_pages: fail_pages.to_vec(),
            }),
        )
    }

    fn write_deck(dir: &Path) -> PathBuf {
        let path = dir.join("talk.pptx");
        // Content is irrelevant behind the mocked capabilities
        std::fs::write(&path, b"PK\x03\x04 deck bytes").unwrap();
        path
    }

    // ==================== Kind detection ====================

    #[tokio::test]
    async fn test_detect_kind_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("doc.pdf");
        let pptx = dir.path().join("deck.pptx");
        std::fs::write(&pdf, b"").unwrap();
        std::fs::write(&pptx, b"").unwrap();

        assert_eq!(detect_kind(&pdf).await.unwrap(), SourceKind::Pdf);
        assert_eq!(detect_kind(&pptx).await.unwrap(), SourceKind::Deck);
    }

    #[tokio::test]
    async fn test_detect_kind_by_magic() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("mystery");
        std::fs::write(&pdf, b"%PDF-1.7 rest").unwrap();
        let zip = dir.path().join("mystery2");
        std::fs::write(&zip, b"PK\x03\x04rest").unwrap();

        assert_eq!(detect_kind(&pdf).await.unwrap(), SourceKind::Pdf);
        assert_eq!(detect_kind(&zip).await.unwrap(), SourceKind::Deck);
    }

    #[tokio::test]
    async fn test_detect_kind_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let other = dir.path().join("notes");
        std::fs::write(&other, b"plain text").unwrap();

        assert!(matches!(
            detect_kind(&other).await,
            Err(SourceError::UnsupportedFormat(_))
        ));
    }

    // ==================== Assembly ====================

    #[tokio::test]
    async fn test_assemble_all_slides() {
        let dir = tempfile::tempdir().unwrap();
        let deck = write_deck(dir.path());
        let out_dir = dir.path().join("out");

        let result = assembler(3, &[])
            .assemble(&deck, &out_dir, &AssembleOptions {
                metadata: MetadataConfig::all(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(result.source.kind, SourceKind::Deck);
        assert_eq!(result.source.digest.len(), 64);
        assert_eq!(result.metadata.title.as_deref(), Some("Mock Deck"));
        assert_eq!(result.slides.len(), 3);

        let indices: Vec<u32> = result.slides.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);

        for slide in &result.slides {
            assert!(slide.image_path.as_ref().unwrap().exists());
            assert_eq!(slide.text, format!("text of slide {}", slide.index));
            assert!(slide.error.is_none());
            assert!(slide.description.is_none());
        }
    }

    #[tokio::test]
    async fn test_assemble_explicit_selector_sorted_unique() {
        let dir = tempfile::tempdir().unwrap();
        let deck = write_deck(dir.path());

        let result = assembler(5, &[])
            .assemble(&deck, &dir.path().join("out"), &AssembleOptions {
                selector: SlideSelector::Indices(vec![4, 2, 4]),
                ..Default::default()
            })
            .await
            .unwrap();

        let indices: Vec<u32> = result.slides.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![2, 4]);
    }

    #[tokio::test]
    async fn test_assemble_rejects_out_of_range_selector() {
        let dir = tempfile::tempdir().unwrap();
        let deck = write_deck(dir.path());

        let result = assembler(3, &[])
            .assemble(&deck, &dir.path().join("out"), &AssembleOptions {
                selector: SlideSelector::Indices(vec![1, 7]),
                ..Default::default()
            })
            .await;

        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::SlideOutOfRange { index: 7, count: 3 }))
        ));
    }

    #[tokio::test]
    async fn test_assemble_render_failure_keeps_index() {
        let dir = tempfile::tempdir().unwrap();
        let deck = write_deck(dir.path());

        let result = assembler(4, &[3])
            .assemble(&deck, &dir.path().join("out"), &AssembleOptions::default())
            .await
            .unwrap();

        assert_eq!(result.slides.len(), 4, "failed index is not dropped");

        let failed = &result.slides[2];
        assert_eq!(failed.index, 3);
        assert!(failed.image_path.is_none());
        assert!(failed.error.as_ref().unwrap().contains("render failed"));
        // text extraction for that index still succeeded
        assert_eq!(failed.text, "text of slide 3");

        for slide in [&result.slides[0], &result.slides[1], &result.slides[3]] {
            assert!(slide.image_path.is_some());
            assert!(slide.error.is_none());
        }
    }

    #[tokio::test]
    async fn test_assemble_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        let result = assembler(3, &[])
            .assemble(
                &dir.path().join("ghost.pptx"),
                &dir.path().join("out"),
                &AssembleOptions::default(),
            )
            .await;

        assert!(matches!(result, Err(Error::Source(_))));
    }

    #[tokio::test]
    async fn test_assemble_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let deck = write_deck(dir.path());
        let out_dir = dir.path().join("nested").join("out");

        assembler(1, &[])
            .assemble(&deck, &out_dir, &AssembleOptions::default())
            .await
            .unwrap();

        assert!(out_dir.join("slide_001.png").exists());
    }
}
