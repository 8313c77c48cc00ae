//! DOCX paragraph extraction.
//!
//! Reads `word/document.xml` out of the zip container and concatenates the
//! text runs of every `w:p` paragraph, one paragraph per line.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use tracing::warn;
use zip::ZipArchive;

use crate::error::ExtractError;
use crate::FileKind;

const DOCUMENT_PART: &str = "word/document.xml";

pub(crate) fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::corrupt(FileKind::Docx, e))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractError::corrupt(FileKind::Docx, format!("{DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::corrupt(FileKind::Docx, e))?;

    paragraphs_from_xml(&xml).map(|paragraphs| paragraphs.join("\n"))
}

/// Text collected for one open `w:p`.
#[derive(Default)]
struct OpenParagraph {
    text: String,
    broken: bool,
}

/// Collect paragraph texts. A paragraph with an undecodable run is dropped;
/// a structural XML error stops the scan and keeps what was read so far.
///
/// Paragraphs nest (text boxes carry their own `w:p` inside a run), so open
/// paragraphs are kept on a stack and each one is emitted when it closes.
fn paragraphs_from_xml(xml: &str) -> Result<Vec<String>, ExtractError> {
    let mut reader = XmlReader::from_str(xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut open: Vec<OpenParagraph> = Vec::new();
    let mut in_text_node = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text_node = true,
                b"w:p" => open.push(OpenParagraph::default()),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match (e.name().as_ref(), open.last_mut()) {
                (b"w:tab", Some(paragraph)) => paragraph.text.push('\t'),
                (b"w:br", Some(paragraph)) => paragraph.text.push('\n'),
                (b"w:p", _) => paragraphs.push(String::new()),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let (true, Some(paragraph)) = (in_text_node, open.last_mut()) {
                    match e.unescape() {
                        Ok(value) => paragraph.text.push_str(&value),
                        Err(err) => {
                            warn!(error = %err, "skipping docx paragraph with undecodable text");
                            paragraph.broken = true;
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text_node = false,
                b"w:p" => {
                    if let Some(paragraph) = open.pop() {
                        if !paragraph.broken {
                            paragraphs.push(paragraph.text);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                if paragraphs.is_empty() {
                    return Err(ExtractError::corrupt(FileKind::Docx, err));
                }
                warn!(
                    error = %err,
                    recovered = paragraphs.len(),
                    "docx XML ended abruptly, keeping recovered paragraphs"
                );
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}
