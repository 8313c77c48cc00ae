use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Declared kind of an uploaded submission file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Text,
    Pdf,
    Docx,
    Image,
}

impl FileKind {
    /// Infer the kind from a file name's extension (case-insensitive).
    pub fn from_filename(name: &str) -> Result<Self, ExtractError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or_else(|| ExtractError::UnsupportedFormat(name.to_string()))?;

        match ext.as_str() {
            "txt" => Ok(FileKind::Text),
            "pdf" => Ok(FileKind::Pdf),
            "docx" => Ok(FileKind::Docx),
            "png" | "jpg" | "jpeg" => Ok(FileKind::Image),
            other => Err(ExtractError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Infer the kind from a MIME type as sent by an upload form.
    pub fn from_mime(mime: &str) -> Result<Self, ExtractError> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence {
            "text/plain" => Ok(FileKind::Text),
            "application/pdf" => Ok(FileKind::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Ok(FileKind::Docx)
            }
            "image/png" | "image/jpeg" => Ok(FileKind::Image),
            other => Err(ExtractError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileKind::Text => "text",
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Image => "image",
        };
        f.write_str(name)
    }
}
