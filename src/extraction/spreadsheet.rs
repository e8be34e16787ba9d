use std::io::Cursor;

use calamine::{Reader, Xlsx};

use super::{ExtractionError, Extractor};
use crate::formats::DocumentFormat;

/// Walks every sheet in workbook order. The first row of each sheet is
/// treated as its header and skipped.
pub struct SpreadsheetExtractor;

impl Extractor for SpreadsheetExtractor {
    fn extract(&self, content: &[u8], _format: DocumentFormat) -> Result<String, ExtractionError> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(content))
            .map_err(|e| ExtractionError::Spreadsheet(e.to_string()))?;

        let mut text = String::new();
        for sheet_name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&sheet_name)
                .map_err(|e| ExtractionError::Spreadsheet(e.to_string()))?;

            text.push_str(&format!("Sheet: {}\n", sheet_name));
            for row in range.rows().skip(1) {
                let cells: Vec<String> = row.iter().map(|cell| cell.to_string()).collect();
                text.push_str(&cells.join("\t"));
                text.push('\n');
            }
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Statement" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

    const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>Item</t></is></c><c r="B1" t="inlineStr"><is><t>Amount</t></is></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>Consulting</t></is></c><c r="B2"><v>1200</v></c></row></sheetData></worksheet>"#;

    fn make_test_xlsx() -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (path, body) in [
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/worksheets/sheet1.xml", SHEET),
        ] {
            zip.start_file(path, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_sheets_are_labelled_and_header_skipped() {
        let text = SpreadsheetExtractor
            .extract(&make_test_xlsx(), DocumentFormat::Xlsx)
            .unwrap();
        assert!(text.starts_with("Sheet: Statement\n"), "got: {:?}", text);
        assert!(text.contains("Consulting\t1200"), "got: {:?}", text);
        assert!(!text.contains("Item"));
    }

    #[test]
    fn test_non_workbook_is_an_error() {
        let err = SpreadsheetExtractor
            .extract(b"not a zip archive", DocumentFormat::Xlsx)
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Spreadsheet(_)));
        assert!(err.to_string().starts_with("Error processing Excel file"));
    }
}
