//! Per-slide text extraction.
//!
//! PDFs use the embedded text layer via pdf-extract; native decks go through
//! the [`DeckReader`] capability. An unreadable slide produces a recorded
//! error for that index, never an aborted batch.

use deckhand_core::{DeckReader, SlideText, SourceError, SourceKind, TextError};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Slide text extractor for both source kinds.
pub struct SlideTextExtractor {
    deck: Arc<dyn DeckReader>,
}

impl SlideTextExtractor {
    /// Create a new extractor backed by the given deck reader.
    #[must_use]
    pub fn new(deck: Arc<dyn DeckReader>) -> Self {
        Self { deck }
    }

    /// Extract text for each selected slide, in selector order.
    ///
    /// The returned list always has one entry per requested index. Per-index
    /// failures are carried in the entry; only an unreadable source file
    /// fails the whole call.
    pub async fn extract(
        &self,
        path: &Path,
        kind: SourceKind,
        indices: &[u32],
    ) -> Result<Vec<SlideText>, SourceError> {
        debug!("Extracting text for {} slides of {:?}", indices.len(), path);
        match kind {
            SourceKind::Pdf => self.pdf_texts(path, indices).await,
            SourceKind::Deck => self.deck_texts(path, indices).await,
        }
    }

    async fn pdf_texts(&self, path: &Path, indices: &[u32]) -> Result<Vec<SlideText>, SourceError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| SourceError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let pages = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        })
        .await
        .map_err(|e| SourceError::Corrupt(format!("text task failed: {e}")))?;

        let texts = match pages {
            Ok(pages) => indices
                .iter()
                .map(|&index| {
                    let text = pages
                        .get((index - 1) as usize)
                        .map(|page| page.trim_end().to_string())
                        .ok_or_else(|| TextError::Unreadable {
                            index,
                            reason: "page missing from text layer".to_string(),
                        });
                    SlideText { index, text }
                })
                .collect(),
            Err(e) => {
                // Text layer unreadable as a whole: record the cause against
                // every requested index and let the rest of the pipeline run.
                warn!("PDF text layer extraction failed for {:?}: {}", path, e);
                indices
                    .iter()
                    .map(|&index| SlideText {
                        index,
                        text: Err(TextError::Unreadable {
                            index,
                            reason: e.to_string(),
                        }),
                    })
                    .collect()
            }
        };

        Ok(texts)
    }

    async fn deck_texts(
        &self,
        path: &Path,
        indices: &[u32],
    ) -> Result<Vec<SlideText>, SourceError> {
        let mut texts = Vec::with_capacity(indices.len());
        for &index in indices {
            let text = self.deck.slide_text(path, index).await;
            if let Err(ref e) = text {
                warn!("Slide {} text extraction failed: {}", index, e);
            }
            texts.push(SlideText { index, text });
        }
        Ok(texts)
    }
}
