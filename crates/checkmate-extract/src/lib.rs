//! Checkmate-Extract: plain text from uploaded submissions
//!
//! Students hand in essays as pasted text or as files. This crate turns the
//! raw bytes of a `.txt`, `.docx`, `.pdf` or image upload into plain text so
//! the rest of Check Mate only ever deals with strings.
//!
//! Multi-part documents are read best-effort: an unreadable PDF page or DOCX
//! paragraph is skipped and the remaining text is returned. A file that cannot
//! be opened at all is an [`ExtractError::Corrupt`].

mod docx;
pub mod error;
mod kind;
pub mod ocr;
mod pdf;

use std::path::Path;

use tracing::debug;

pub use error::ExtractError;
pub use kind::FileKind;
pub use ocr::{OcrEngine, TesseractCli};

/// Result alias for extraction.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Converts upload bytes into text, with an optional OCR engine for images.
#[derive(Default)]
pub struct TextExtractor {
    ocr: Option<Box<dyn OcrEngine>>,
}

impl TextExtractor {
    /// Extractor without OCR; image uploads fail with `OcrUnavailable`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an OCR engine for image uploads.
    pub fn with_ocr(mut self, engine: Box<dyn OcrEngine>) -> Self {
        self.ocr = Some(engine);
        self
    }

    /// Extract text from `bytes` declared as `kind`.
    pub fn extract(&self, bytes: &[u8], kind: FileKind) -> Result<String> {
        debug!(kind = %kind, bytes = bytes.len(), "extracting submission text");
        match kind {
            FileKind::Text => Ok(decode_text(bytes)),
            FileKind::Docx => docx::extract_docx(bytes),
            FileKind::Pdf => pdf::extract_pdf(bytes),
            FileKind::Image => {
                let engine = self.ocr.as_ref().ok_or(ExtractError::OcrUnavailable)?;
                let rgb = ocr::decode_rgb(bytes)?;
                debug!(engine = engine.name(), "running OCR");
                engine.recognize(&rgb)
            }
        }
    }

    /// Extract text from a file name plus its bytes, inferring the kind.
    pub fn extract_named(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        let kind = FileKind::from_filename(file_name)?;
        self.extract(bytes, kind)
    }

    /// Read a file from disk and extract its text.
    pub fn extract_path(&self, path: &Path) -> Result<String> {
        let kind = FileKind::from_filename(&path.to_string_lossy())?;
        let bytes = std::fs::read(path)?;
        self.extract(&bytes, kind)
    }
}

/// UTF-8 first, then Latin-1 (every byte maps to one char).
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}
