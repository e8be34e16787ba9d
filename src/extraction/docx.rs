use std::io::{Cursor, Read};

use super::{ExtractionError, Extractor};
use crate::formats::DocumentFormat;

const DOCUMENT_XML: &str = "word/document.xml";

/// Reads the WordprocessingML body: top-level paragraphs first, one per line,
/// then every table row with each cell followed by a tab.
pub struct DocxExtractor;

impl Extractor for DocxExtractor {
    fn extract(&self, content: &[u8], _format: DocumentFormat) -> Result<String, ExtractionError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(content))
            .map_err(|e| ExtractionError::Docx(format!("not a zip container: {}", e)))?;

        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_XML)
            .map_err(|e| ExtractionError::Docx(format!("{}: {}", DOCUMENT_XML, e)))?
            .read_to_string(&mut xml)
            .map_err(|e| ExtractionError::Docx(format!("{}: {}", DOCUMENT_XML, e)))?;

        Ok(body_text(&xml))
    }
}

#[derive(Default)]
struct BodyCollector {
    paragraphs: String,
    tables: String,
    table_depth: usize,
    in_text_run: bool,
    paragraph: String,
    cell: Vec<String>,
    row: Vec<String>,
}

impl BodyCollector {
    fn open(&mut self, name: &str) {
        match name {
            "w:tbl" => self.table_depth += 1,
            "w:tr" if self.table_depth == 1 => self.row.clear(),
            "w:tc" if self.table_depth == 1 => self.cell.clear(),
            "w:p" => self.paragraph.clear(),
            "w:t" => self.in_text_run = true,
            _ => {}
        }
    }

    fn close(&mut self, name: &str) {
        match name {
            "w:tbl" => self.table_depth = self.table_depth.saturating_sub(1),
            "w:t" => self.in_text_run = false,
            "w:p" => {
                let paragraph = std::mem::take(&mut self.paragraph);
                if self.table_depth == 0 {
                    self.paragraphs.push_str(&paragraph);
                    self.paragraphs.push('\n');
                } else {
                    self.cell.push(paragraph);
                }
            }
            "w:tc" if self.table_depth == 1 => {
                let cell = self.cell.join("\n");
                self.cell.clear();
                self.row.push(cell);
            }
            "w:tr" if self.table_depth == 1 => {
                for cell in self.row.drain(..) {
                    self.tables.push_str(&cell);
                    self.tables.push('\t');
                }
                self.tables.push('\n');
            }
            _ => {}
        }
    }

    fn empty(&mut self, name: &str) {
        match name {
            "w:tab" => self.paragraph.push('\t'),
            "w:br" | "w:cr" => self.paragraph.push('\n'),
            // <w:p/> is an empty paragraph
            "w:p" => {
                self.open(name);
                self.close(name);
            }
            _ => {}
        }
    }

    fn text(&mut self, raw: &str) {
        if self.in_text_run {
            self.paragraph.push_str(&unescape(raw));
        }
    }
}

fn body_text(xml: &str) -> String {
    let mut collector = BodyCollector::default();
    let mut rest = xml;

    while let Some(start) = rest.find('<') {
        collector.text(&rest[..start]);
        let Some(end) = rest[start..].find('>') else {
            break;
        };
        let tag = &rest[start + 1..start + end];
        rest = &rest[start + end + 1..];

        if tag.starts_with('?') || tag.starts_with('!') {
            continue;
        }
        if let Some(name) = tag.strip_prefix('/') {
            collector.close(tag_name(name));
        } else if let Some(inner) = tag.strip_suffix('/') {
            collector.empty(tag_name(inner));
        } else {
            collector.open(tag_name(tag));
        }
    }

    let BodyCollector { mut paragraphs, tables, .. } = collector;
    paragraphs.push_str(&tables);
    paragraphs
}

fn tag_name(tag: &str) -> &str {
    tag.split(|c: char| c.is_whitespace()).next().unwrap_or("")
}

/// Decodes the predefined XML entities and numeric character references.
/// Anything unrecognised is kept as written.
fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "amp" => Some('&'),
        _ => {
            let number = entity.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) fn make_test_docx(body: &str) -> Vec<u8> {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        );
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DOCUMENT_XML, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(document.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_paragraphs_then_tables() {
        let body = concat!(
            r#"<w:p><w:r><w:t>Curriculum Vitae</w:t></w:r></w:p>"#,
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Skills</w:t></w:r></w:p></w:tc>"#,
            r#"<w:tc><w:p><w:r><w:t>Rust</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
            r#"<w:p><w:r><w:t xml:space="preserve">Work </w:t></w:r><w:r><w:t>experience</w:t></w:r></w:p>"#,
        );
        let text = DocxExtractor
            .extract(&make_test_docx(body), DocumentFormat::Docx)
            .unwrap();
        assert_eq!(text, "Curriculum Vitae\nWork experience\nSkills\tRust\t\n");
    }

    #[test]
    fn test_entities_tabs_and_empty_paragraphs() {
        let body = r#"<w:p><w:r><w:t>Smith &amp; Sons</w:t><w:tab/><w:t>&lt;Ltd&gt;</w:t></w:r></w:p><w:p/>"#;
        let text = DocxExtractor
            .extract(&make_test_docx(body), DocumentFormat::Docx)
            .unwrap();
        assert_eq!(text, "Smith & Sons\t<Ltd>\n\n");
    }

    #[test]
    fn test_numeric_character_references() {
        assert_eq!(unescape("It&#8217;s"), "It\u{2019}s");
        assert_eq!(unescape("&#x2019;quoted&#X41;"), "\u{2019}quotedA");
        assert_eq!(unescape("&amp;lt; stays &lt;"), "&lt; stays <");
        assert_eq!(unescape("R&D &bogus; &#xZZ; 5 & 6"), "R&D &bogus; &#xZZ; 5 & 6");
    }

    #[test]
    fn test_missing_document_part_is_an_error() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/styles.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<w:styles/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let err = DocxExtractor.extract(&bytes, DocumentFormat::Docx).unwrap_err();
        assert!(matches!(err, ExtractionError::Docx(_)));
    }

    #[test]
    fn test_non_zip_is_an_error() {
        let err = DocxExtractor
            .extract(b"plain text pretending", DocumentFormat::Docx)
            .unwrap_err();
        assert!(err.to_string().contains("not a zip container"));
    }
}
