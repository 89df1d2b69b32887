//! PPTX deck reader.
//!
//! A thin [`DeckReader`] over the PPTX container: enough surface to count
//! slides, pull the text runs of a slide in document order, and read the
//! docProps part. Not a general OOXML parser.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deckhand_core::{DeckProperties, DeckReader, SourceError, TextError};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// Deck reader for `.pptx` files.
pub struct PptxDeckReader;

impl PptxDeckReader {
    /// Create a new PPTX reader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PptxDeckReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeckReader for PptxDeckReader {
    async fn slide_count(&self, deck: &Path) -> Result<u32, SourceError> {
        let deck = deck.to_path_buf();
        tokio::task::spawn_blocking(move || count_slides(&deck))
            .await
            .map_err(|e| SourceError::Corrupt(format!("deck task failed: {e}")))?
    }

    async fn slide_text(&self, deck: &Path, index: u32) -> Result<String, TextError> {
        let deck = deck.to_path_buf();
        tokio::task::spawn_blocking(move || read_slide_text(&deck, index))
            .await
            .map_err(|e| TextError::Unreadable {
                index,
                reason: format!("deck task failed: {e}"),
            })?
    }

    async fn properties(&self, deck: &Path) -> Result<DeckProperties, SourceError> {
        let deck = deck.to_path_buf();
        tokio::task::spawn_blocking(move || read_properties(&deck))
            .await
            .map_err(|e| SourceError::Corrupt(format!("deck task failed: {e}")))?
    }
}

fn open_archive(path: &Path) -> Result<ZipArchive<std::fs::File>, SourceError> {
    let file = std::fs::File::open(path).map_err(|e| SourceError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    ZipArchive::new(file).map_err(|e| SourceError::Corrupt(format!("not a PPTX container: {e}")))
}

/// Slide number of a `ppt/slides/slideN.xml` entry name.
fn slide_number(entry: &str) -> Option<u32> {
    entry
        .strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

fn count_slides(path: &Path) -> Result<u32, SourceError> {
    let archive = open_archive(path)?;
    let count = archive
        .file_names()
        .filter(|name| slide_number(name).is_some())
        .count();
    debug!("{:?} contains {} slides", path, count);
    Ok(count as u32)
}

fn read_slide_text(path: &Path, index: u32) -> Result<String, TextError> {
    let unreadable = |reason: String| TextError::Unreadable { index, reason };

    let mut archive = open_archive(path).map_err(|e| unreadable(e.to_string()))?;
    let entry = format!("ppt/slides/slide{index}.xml");
    let mut file = archive
        .by_name(&entry)
        .map_err(|e| unreadable(format!("{entry}: {e}")))?;

    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| unreadable(e.to_string()))?;

    extract_text_runs(&xml).map_err(unreadable)
}

/// Collect `<a:t>` runs in document order; paragraph ends become line breaks.
fn extract_text_runs(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"a:t" => in_run = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"a:t" => in_run = false,
                b"a:p" => {
                    if !current.is_empty() {
                        lines.push(std::mem::take(&mut current));
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_run => {
                current.push_str(&t.unescape().map_err(|e| e.to_string())?);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    Ok(lines.join("\n"))
}

fn read_properties(path: &Path) -> Result<DeckProperties, SourceError> {
    let mut archive = open_archive(path)?;
    let mut props = DeckProperties::default();

    let counted = archive
        .file_names()
        .filter(|name| slide_number(name).is_some())
        .count() as u32;

    if let Some(xml) = read_entry(&mut archive, "docProps/core.xml") {
        parse_core_properties(&xml, &mut props);
    }
    if let Some(xml) = read_entry(&mut archive, "docProps/app.xml") {
        parse_app_properties(&xml, &mut props);
    }

    if props.slide_count.is_none() {
        props.slide_count = Some(counted);
    }
    Ok(props)
}

fn read_entry(archive: &mut ZipArchive<std::fs::File>, name: &str) -> Option<String> {
    let mut file = archive.by_name(name).ok()?;
    let mut xml = String::new();
    file.read_to_string(&mut xml).ok()?;
    Some(xml)
}

#[derive(Clone, Copy)]
enum CoreField {
    Title,
    Creator,
    Subject,
    Language,
    Created,
    Modified,
    LastPrinted,
}

fn parse_core_properties(xml: &str, props: &mut DeckProperties) {
    let mut reader = Reader::from_str(xml);
    let mut field: Option<CoreField> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                field = match e.name().as_ref() {
                    b"dc:title" => Some(CoreField::Title),
                    b"dc:creator" => Some(CoreField::Creator),
                    b"dc:subject" => Some(CoreField::Subject),
                    b"dc:language" => Some(CoreField::Language),
                    b"dcterms:created" => Some(CoreField::Created),
                    b"dcterms:modified" => Some(CoreField::Modified),
                    b"cp:lastPrinted" => Some(CoreField::LastPrinted),
                    _ => None,
                };
            }
            Ok(Event::Text(t)) => {
                let Some(field) = field else { continue };
                let Ok(value) = t.unescape() else { continue };
                let value = value.trim();
                if value.is_empty() {
                    continue;
                }
                match field {
                    CoreField::Title => props.title = Some(value.to_string()),
                    CoreField::Creator => props.author = Some(value.to_string()),
                    CoreField::Subject => props.subject = Some(value.to_string()),
                    CoreField::Language => props.language = Some(value.to_string()),
                    CoreField::Created => props.created = parse_w3c_date(value),
                    CoreField::Modified => props.modified = parse_w3c_date(value),
                    CoreField::LastPrinted => props.last_printed = parse_w3c_date(value),
                }
            }
            Ok(Event::End(_)) => field = None,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => break,
        }
    }
}

fn parse_app_properties(xml: &str, props: &mut DeckProperties) {
    let mut reader = Reader::from_str(xml);
    let mut in_slides = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => in_slides = e.name().as_ref() == b"Slides",
            Ok(Event::Text(t)) if in_slides => {
                if let Some(count) = t.unescape().ok().and_then(|v| v.trim().parse().ok()) {
                    props.slide_count = Some(count);
                }
            }
            Ok(Event::End(_)) => in_slides = false,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => break,
        }
    }
}

fn parse_w3c_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
