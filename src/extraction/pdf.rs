use lopdf::Document;
use tracing::debug;

use super::{ExtractionError, Extractor};
use crate::formats::DocumentFormat;

/// Extracts the text layer of every page, in page order.
pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn extract(&self, content: &[u8], _format: DocumentFormat) -> Result<String, ExtractionError> {
        let doc = Document::load_mem(content).map_err(|e| ExtractionError::Pdf(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(ExtractionError::Pdf("document is encrypted".to_string()));
        }

        let mut text = String::new();
        // get_pages is keyed by page number, so iteration is already in page order
        for page_num in doc.get_pages().keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    if !page_text.ends_with('\n') {
                        text.push('\n');
                    }
                }
                Err(e) => debug!(page = page_num, error = %e, "Skipping page without extractable text"),
            }
        }

        Ok(text)
    }
}
