//! Error types for checkmate-extract

use thiserror::Error;

use crate::FileKind;

/// Errors that can occur while turning an upload into plain text
#[derive(Error, Debug)]
pub enum ExtractError {
    /// File kind is not one of txt / pdf / docx / image
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Content could not be parsed as the declared kind
    #[error("Corrupt {kind} content: {message}")]
    Corrupt { kind: FileKind, message: String },

    /// Image upload but no OCR engine was configured
    #[error("No OCR engine is configured for image uploads")]
    OcrUnavailable,

    /// OCR engine ran but failed
    #[error("OCR failed: {0}")]
    Ocr(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    pub(crate) fn corrupt(kind: FileKind, message: impl std::fmt::Display) -> Self {
        ExtractError::Corrupt {
            kind,
            message: message.to_string(),
        }
    }
}
