//! OCR fallback for image submissions.
//!
//! Recognition itself is delegated to an [`OcrEngine`]; this module only
//! decodes the upload into an RGB bitmap and hands it over.

use std::io::{Cursor, Write};
use std::process::{Child, Command, Output, Stdio};

use image::{DynamicImage, ImageFormat, RgbImage};
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::FileKind;

/// Pluggable text recognizer for decoded images.
pub trait OcrEngine: Send + Sync {
    /// Recognize text in an RGB image.
    fn recognize(&self, image: &RgbImage) -> Result<String, ExtractError>;

    /// Human-readable engine name.
    fn name(&self) -> &str;
}

/// Decode image bytes (png / jpeg) into RGB.
pub(crate) fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, ExtractError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| ExtractError::corrupt(FileKind::Image, e))?;
    Ok(decoded.to_rgb8())
}

/// Write `input` to the child's stdin, then wait for it. A failed write
/// (the child exited early) kills and reaps the child before returning.
fn feed_and_wait(mut child: Child, input: &[u8]) -> Result<Output, ExtractError> {
    if let Some(mut stdin) = child.stdin.take() {
        if let Err(err) = stdin.write_all(input) {
            drop(stdin);
            let _ = child.kill();
            let reaped = child.wait_with_output();
            warn!(error = %err, exited = reaped.is_ok(), "OCR process stopped reading input");
            return Err(ExtractError::Ocr(format!("failed to send image: {err}")));
        }
    }
    Ok(child.wait_with_output()?)
}

/// Runs the `tesseract` binary (`tesseract stdin stdout -l <langs>`).
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: String,
    languages: String,
}

impl Default for TesseractCli {
    fn default() -> Self {
        TesseractCli {
            binary: "tesseract".to_string(),
            languages: "kor+eng".to_string(),
        }
    }
}

impl TesseractCli {
    pub fn new(binary: &str, languages: &str) -> Self {
        TesseractCli {
            binary: binary.to_string(),
            languages: languages.to_string(),
        }
    }

    /// Whether the configured binary can be executed.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image: &RgbImage) -> Result<String, ExtractError> {
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(image.clone())
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| ExtractError::Ocr(format!("failed to encode image: {e}")))?;

        let child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", &self.languages])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExtractError::Ocr(format!("failed to start {}: {e}", self.binary)))?;
        let output = feed_and_wait(child, &png)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Ocr(stderr.trim().to_string()));
        }

        debug!(bytes = output.stdout.len(), "tesseract finished");
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}
