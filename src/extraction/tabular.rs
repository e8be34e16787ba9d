use csv::ReaderBuilder;

use super::{ExtractionError, Extractor};
use crate::formats::DocumentFormat;

/// Emits each data row as tab-separated cells; the header row is skipped.
pub struct CsvExtractor;

impl Extractor for CsvExtractor {
    fn extract(&self, content: &[u8], _format: DocumentFormat) -> Result<String, ExtractionError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content);

        let mut text = String::new();
        for record in rdr.records() {
            let record = record?;
            text.push_str(&record.iter().collect::<Vec<_>>().join("\t"));
            text.push('\n');
        }
        Ok(text)
    }
}
