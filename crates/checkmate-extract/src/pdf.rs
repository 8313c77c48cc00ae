use lopdf::Document;
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::FileKind;

/// Extract text page by page; pages that fail to decode are skipped.
pub(crate) fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let document = Document::load_mem(bytes).map_err(|e| ExtractError::corrupt(FileKind::Pdf, e))?;

    let pages = document.get_pages();
    let mut texts = Vec::with_capacity(pages.len());
    for page_number in pages.keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) => texts.push(text),
            Err(err) => {
                warn!(page = page_number, error = %err, "skipping unreadable pdf page");
            }
        }
    }

    debug!(
        pages = pages.len(),
        extracted = texts.len(),
        "pdf text extraction finished"
    );
    Ok(texts.join("\n"))
}
