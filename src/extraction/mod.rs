//! Text Extraction
//!
//! One extractor per format family, all behind the [`Extractor`] trait:
//! - PDF via `lopdf`
//! - Images via an [`OcrEngine`] (Tesseract with the `ocr` feature)
//! - DOCX by reading `word/document.xml` out of the zip container
//! - XLSX via `calamine`
//! - CSV via `csv`
//!
//! [`ExtractorRegistry`] is the routing table from a [`DocumentFormat`] to its
//! extractor. Extractors are blocking and are run on the worker pool.

pub mod docx;
pub mod ocr;
pub mod pdf;
pub mod spreadsheet;
pub mod tabular;

pub use docx::DocxExtractor;
pub use ocr::{ImageExtractor, OcrEngine};
pub use pdf::PdfExtractor;
pub use spreadsheet::SpreadsheetExtractor;
pub use tabular::CsvExtractor;

#[cfg(feature = "ocr")]
pub use ocr::TesseractOcr;

use std::collections::HashMap;
use std::sync::Arc;

use crate::formats::{DocumentFormat, FormatFamily};

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Failed to parse PDF: {0}")]
    Pdf(String),

    #[error("Error processing Excel file: {0}")]
    Spreadsheet(String),

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read DOCX: {0}")]
    Docx(String),

    #[error("Error processing image: {0}")]
    Image(String),

    #[error("OCR support is not enabled")]
    OcrUnavailable,
}

/// Turns raw file content into plain text.
pub trait Extractor: Send + Sync {
    fn extract(&self, content: &[u8], format: DocumentFormat) -> Result<String, ExtractionError>;
}

/// Maps format families to extractors.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: HashMap<FormatFamily, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry covering every [`FormatFamily`].
    pub fn with_defaults(ocr: Option<Arc<dyn OcrEngine>>) -> Self {
        Self::new()
            .register(FormatFamily::Pdf, PdfExtractor)
            .register(FormatFamily::Image, ImageExtractor::new(ocr))
            .register(FormatFamily::WordDocument, DocxExtractor)
            .register(FormatFamily::Spreadsheet, SpreadsheetExtractor)
            .register(FormatFamily::Csv, CsvExtractor)
    }

    pub fn register<E>(mut self, family: FormatFamily, extractor: E) -> Self
    where
        E: Extractor + 'static,
    {
        self.extractors.insert(family, Arc::new(extractor));
        self
    }

    pub fn route(&self, format: DocumentFormat) -> Option<Arc<dyn Extractor>> {
        self.extractors.get(&format.family()).cloned()
    }

    pub fn supports(&self, format: DocumentFormat) -> bool {
        self.extractors.contains_key(&format.family())
    }
}
