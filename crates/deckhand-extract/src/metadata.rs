//! Document metadata extraction.
//!
//! Pulls the configured subset of document properties from either source
//! kind. PDFs are read with lopdf (Info dictionary, page tree, encryption
//! flag, header version); native decks go through the [`DeckReader`]
//! capability. A missing property yields `None`, never an error; a corrupt
//! document fails the whole call.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use deckhand_core::{DeckReader, MetadataConfig, MetadataRecord, SourceError, SourceKind};
use lopdf::{Dictionary, Document, Object};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Config-gated metadata extractor for both source kinds.
pub struct MetadataExtractor {
    deck: Arc<dyn DeckReader>,
}

impl MetadataExtractor {
    /// Create a new extractor backed by the given deck reader.
    #[must_use]
    pub fn new(deck: Arc<dyn DeckReader>) -> Self {
        Self { deck }
    }

    /// Extract the requested properties that apply to `kind`.
    ///
    /// Keys disabled in `config`, inapplicable to the kind, or absent from
    /// the document are left as `None`.
    pub async fn extract(
        &self,
        path: &Path,
        kind: SourceKind,
        config: &MetadataConfig,
    ) -> Result<MetadataRecord, SourceError> {
        debug!("Extracting metadata from {:?} ({:?})", path, kind);
        match kind {
            SourceKind::Pdf => {
                let bytes = read_file(path).await?;
                let config = *config;
                tokio::task::spawn_blocking(move || pdf_metadata(&bytes, &config))
                    .await
                    .map_err(|e| SourceError::Corrupt(format!("metadata task failed: {e}")))?
            }
            SourceKind::Deck => self.deck_metadata(path, config).await,
        }
    }

    async fn deck_metadata(
        &self,
        path: &Path,
        config: &MetadataConfig,
    ) -> Result<MetadataRecord, SourceError> {
        let props = self.deck.properties(path).await?;

        let mut record = MetadataRecord::default();
        if config.title {
            record.title = props.title;
        }
        if config.author {
            record.author = props.author;
        }
        if config.subject {
            record.subject = props.subject;
        }
        if config.created {
            record.created = props.created;
        }
        if config.modified {
            record.modified = props.modified;
        }
        if config.language {
            record.language = props.language;
        }
        if config.last_printed {
            record.last_printed = props.last_printed;
        }
        if config.slide_count {
            record.slide_count = match props.slide_count {
                Some(count) => Some(count),
                None => self.deck.slide_count(path).await.ok(),
            };
        }
        // encrypted / pdf_version do not apply to decks
        Ok(record)
    }
}

/// Number of pages in a PDF document.
pub async fn pdf_page_count(path: &Path) -> Result<u32, SourceError> {
    let bytes = read_file(path).await?;
    tokio::task::spawn_blocking(move || {
        let doc =
            Document::load_mem(&bytes).map_err(|e| SourceError::Corrupt(e.to_string()))?;
        Ok(doc.get_pages().len() as u32)
    })
    .await
    .map_err(|e| SourceError::Corrupt(format!("page count task failed: {e}")))?
}

async fn read_file(path: &Path) -> Result<Vec<u8>, SourceError> {
    tokio::fs::read(path).await.map_err(|e| SourceError::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

fn pdf_metadata(bytes: &[u8], config: &MetadataConfig) -> Result<MetadataRecord, SourceError> {
    let doc = Document::load_mem(bytes).map_err(|e| SourceError::Corrupt(e.to_string()))?;
    let info = pdf_info_dict(&doc);

    let mut record = MetadataRecord::default();
    if config.title {
        record.title = info.and_then(|d| pdf_text(d, b"Title"));
    }
    if config.author {
        record.author = info.and_then(|d| pdf_text(d, b"Author"));
    }
    if config.subject {
        record.subject = info.and_then(|d| pdf_text(d, b"Subject"));
    }
    if config.created {
        record.created = info
            .and_then(|d| pdf_text(d, b"CreationDate"))
            .and_then(|s| parse_pdf_date(&s));
    }
    if config.modified {
        record.modified = info
            .and_then(|d| pdf_text(d, b"ModDate"))
            .and_then(|s| parse_pdf_date(&s));
    }
    if config.slide_count {
        record.slide_count = Some(doc.get_pages().len() as u32);
    }
    if config.encrypted {
        record.encrypted = Some(doc.trailer.get(b"Encrypt").is_ok());
    }
    if config.pdf_version {
        record.pdf_version = Some(doc.version.clone());
    }
    // language / last_printed do not apply to PDFs
    Ok(record)
}

fn pdf_info_dict(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn pdf_text(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => {
            let text = decode_pdf_string(bytes);
            (!text.is_empty()).then_some(text)
        }
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE when BOM-prefixed, byte string otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

/// Parse a `D:YYYYMMDDHHMMSS...` PDF date. Timezone suffixes are ignored;
/// values are treated as UTC, which is how the rest of the pipeline stores
/// timestamps.
fn parse_pdf_date(raw: &str) -> Option<DateTime<Utc>> {
    let digits: String = raw
        .trim_start_matches("D:")
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    if digits.len() < 8 {
        return None;
    }

    let year: i32 = digits[0..4].parse().ok()?;
    let month: u32 = digits[4..6].parse().ok()?;
    let day: u32 = digits[6..8].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let field = |range: std::ops::Range<usize>| -> u32 {
        digits
            .get(range)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    };
    let time = NaiveTime::from_hms_opt(field(8..10), field(10..12), field(12..14))?;

    Some(NaiveDateTime::new(date, time).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Datelike;
    use deckhand_core::{DeckProperties, TextError};
    use lopdf::dictionary;

    // ==================== Helpers ====================

    fn build_test_pdf(with_info: bool) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if with_info {
            let info_id = doc.add_object(dictionary! {
                "Title" => Object::string_literal("Quarterly Review"),
                "Author" => Object::string_literal("Alice"),
                "CreationDate" => Object::string_literal("D:20240102030405Z"),
            });
            doc.trailer.set("Info", info_id);
        }

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    struct StubDeckReader {
        props: DeckProperties,
    }

    #[async_trait]
    impl DeckReader for StubDeckReader {
        async fn slide_count(&self, _deck: &Path) -> Result<u32, SourceError> {
            Ok(3)
        }

        async fn slide_text(&self, _deck: &Path, _index: u32) -> Result<String, TextError> {
            Ok(String::new())
        }

        async fn properties(&self, _deck: &Path) -> Result<DeckProperties, SourceError> {
            Ok(self.props.clone())
        }
    }

    fn deck_extractor(props: DeckProperties) -> MetadataExtractor {
        MetadataExtractor::new(Arc::new(StubDeckReader { props }))
    }

    // ==================== PDF date parsing ====================

    #[test]
    fn test_parse_pdf_date_full() {
        let date = parse_pdf_date("D:20240102030405Z").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 2);
    }

    #[test]
    fn test_parse_pdf_date_date_only() {
        let date = parse_pdf_date("D:20231130").unwrap();
        assert_eq!(date.year(), 2023);
        assert_eq!(date.month(), 11);
    }

    #[test]
    fn test_parse_pdf_date_rejects_garbage() {
        assert!(parse_pdf_date("yesterday").is_none());
        assert!(parse_pdf_date("D:2024").is_none());
        assert!(parse_pdf_date("D:20241350000000").is_none());
    }

    // ==================== PDF string decoding ====================

    #[test]
    fn test_decode_pdf_string_ascii() {
        assert_eq!(decode_pdf_string(b"Hello"), "Hello");
    }

    #[test]
    fn test_decode_pdf_string_utf16be() {
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_pdf_string(&bytes), "Hi");
    }

    // ==================== PDF metadata ====================

    #[tokio::test]
    async fn test_pdf_metadata_respects_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, build_test_pdf(true)).unwrap();

        let extractor = deck_extractor(DeckProperties::default());
        let config = MetadataConfig {
            title: true,
            ..Default::default()
        };
        let record = extractor
            .extract(&path, SourceKind::Pdf, &config)
            .await
            .unwrap();

        assert_eq!(record.title.as_deref(), Some("Quarterly Review"));
        assert!(record.author.is_none(), "author was not requested");
        assert!(record.slide_count.is_none());
    }

    #[tokio::test]
    async fn test_pdf_metadata_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, build_test_pdf(true)).unwrap();

        let extractor = deck_extractor(DeckProperties::default());
        let record = extractor
            .extract(&path, SourceKind::Pdf, &MetadataConfig::all())
            .await
            .unwrap();

        assert_eq!(record.author.as_deref(), Some("Alice"));
        assert_eq!(record.slide_count, Some(1));
        assert_eq!(record.encrypted, Some(false));
        assert_eq!(record.pdf_version.as_deref(), Some("1.5"));
        assert!(record.created.is_some());
        // deck-only keys stay empty for a PDF even when requested
        assert!(record.language.is_none());
        assert!(record.last_printed.is_none());
    }

    #[tokio::test]
    async fn test_pdf_metadata_missing_info_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.pdf");
        std::fs::write(&path, build_test_pdf(false)).unwrap();

        let extractor = deck_extractor(DeckProperties::default());
        let record = extractor
            .extract(&path, SourceKind::Pdf, &MetadataConfig::all())
            .await
            .unwrap();

        assert!(record.title.is_none());
        assert_eq!(record.slide_count, Some(1));
    }

    #[tokio::test]
    async fn test_pdf_metadata_corrupt_document_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let extractor = deck_extractor(DeckProperties::default());
        let result = extractor
            .extract(&path, SourceKind::Pdf, &MetadataConfig::all())
            .await;

        assert!(matches!(result, Err(SourceError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_pdf_page_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, build_test_pdf(false)).unwrap();

        assert_eq!(pdf_page_count(&path).await.unwrap(), 1);
    }

    // ==================== Deck metadata ====================

    #[tokio::test]
    async fn test_deck_metadata_gating() {
        let props = DeckProperties {
            title: Some("Deck".to_string()),
            author: Some("Bob".to_string()),
            language: Some("en-US".to_string()),
            slide_count: Some(12),
            ..Default::default()
        };
        let extractor = deck_extractor(props);

        let config = MetadataConfig {
            title: true,
            language: true,
            ..Default::default()
        };
        let record = extractor
            .extract(Path::new("/deck.pptx"), SourceKind::Deck, &config)
            .await
            .unwrap();

        assert_eq!(record.title.as_deref(), Some("Deck"));
        assert_eq!(record.language.as_deref(), Some("en-US"));
        assert!(record.author.is_none());
        assert!(record.slide_count.is_none());
    }

    #[tokio::test]
    async fn test_deck_metadata_slide_count_fallback() {
        // app.xml gave no count; the reader's slide enumeration is used instead
        let extractor = deck_extractor(DeckProperties::default());

        let config = MetadataConfig {
            slide_count: true,
            ..Default::default()
        };
        let record = extractor
            .extract(Path::new("/deck.pptx"), SourceKind::Deck, &config)
            .await
            .unwrap();

        assert_eq!(record.slide_count, Some(3));
    }

    #[tokio::test]
    async fn test_deck_metadata_pdf_only_keys_skipped() {
        let extractor = deck_extractor(DeckProperties::default());
        let record = extractor
            .extract(Path::new("/deck.pptx"), SourceKind::Deck, &MetadataConfig::all())
            .await
            .unwrap();

        assert!(record.encrypted.is_none());
        assert!(record.pdf_version.is_none());
    }
}
