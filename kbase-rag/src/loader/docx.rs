use std::io::{Cursor, Read};
use std::sync::LazyLock;

use regex::Regex;
use tracing::error;

use crate::document::Document;
use crate::error::{RagError, Result};

use super::{DocumentLoader, decode_entities};

const DOCUMENT_PART: &str = "word/document.xml";

static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:p(?:\s[^>]*?)?(?:/>|>(.*?)</w:p>)")
        .expect("unreachable error: invalid paragraph pattern")
});

// Paragraph properties hold layout such as tab stops, never text.
static PARAGRAPH_PROPERTIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:pPr(?:\s[^>]*?)?(?:/>|>.*?</w:pPr>)")
        .expect("unreachable error: invalid paragraph properties pattern")
});

static RUN_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>|<w:(tab|br|cr)(?:\s[^>]*)?/>")
        .expect("unreachable error: invalid run pattern")
});

/// Loads the body text of a Word (`.docx`) file as a single document.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxLoader;

impl DocumentLoader for DocxLoader {
    fn load(&self, bytes: &[u8], name: &str) -> Result<Vec<Document>> {
        let parse_error = |message: String| {
            error!(source = name, error = %message, "failed to parse Word document");
            RagError::ParseError { source_name: name.to_string(), message }
        };

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| parse_error(format!("not a Word document: {e}")))?;
        let mut xml = String::new();
        archive
            .by_name(DOCUMENT_PART)
            .map_err(|e| parse_error(format!("missing {DOCUMENT_PART}: {e}")))?
            .read_to_string(&mut xml)
            .map_err(|e| parse_error(format!("failed to read {DOCUMENT_PART}: {e}")))?;

        Ok(vec![Document::new(paragraph_text(&xml), name)])
    }
}

/// Concatenate the runs of each `<w:p>`, one line per paragraph.
fn paragraph_text(xml: &str) -> String {
    PARAGRAPH
        .captures_iter(xml)
        .map(|paragraph| {
            let Some(body) = paragraph.get(1) else {
                return String::new();
            };
            let body = PARAGRAPH_PROPERTIES.replace_all(body.as_str(), "");
            let mut line = String::new();
            for item in RUN_ITEM.captures_iter(&body) {
                if let Some(text) = item.get(1) {
                    line.push_str(&decode_entities(text.as_str()));
                } else if item.get(2).is_some_and(|m| m.as_str() == "tab") {
                    line.push('\t');
                } else {
                    line.push('\n');
                }
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    fn docx(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(DOCUMENT_PART, SimpleFileOptions::default()).unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn body(paragraphs: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{paragraphs}</w:body></w:document>"#
        )
    }

    #[test]
    fn paragraphs_become_lines() {
        let xml = body(
            r#"<w:p><w:r><w:t>Hello</w:t></w:r><w:r><w:t xml:space="preserve"> world</w:t></w:r></w:p><w:p/><w:p w:rsidR="00A1"><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Fish &amp; chips</w:t><w:tab/><w:t>x</w:t></w:r></w:p>"#,
        );
        let docs = DocxLoader.load(&docx(&xml), "memo.docx").unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "Hello world\n\nFish & chips\tx");
        assert_eq!(docs[0].source(), "memo.docx");
    }

    #[test]
    fn line_breaks_inside_a_paragraph() {
        let xml = body(r#"<w:p><w:r><w:t>one</w:t><w:br/><w:t>two</w:t></w:r></w:p>"#);
        let docs = DocxLoader.load(&docx(&xml), "b.docx").unwrap();
        assert_eq!(docs[0].content, "one\ntwo");
    }

    #[test]
    fn tab_stops_are_not_text() {
        let heading = paragraph_text(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/><w:tab w:val="right" w:pos="9000"/></w:tabs></w:pPr><w:r><w:t>Heading</w:t></w:r></w:p>"#,
        );
        assert_eq!(heading, "Heading");

        let toc = paragraph_text(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="right" w:leader="dot" w:pos="9350"/></w:tabs></w:pPr><w:r><w:t>Intro</w:t></w:r><w:r><w:tab/></w:r><w:r><w:t>1</w:t></w:r></w:p>"#,
        );
        assert_eq!(toc, "Intro\t1");
    }

    #[test]
    fn not_a_zip_is_a_parse_error() {
        let err = DocxLoader.load(b"plain text", "fake.docx").unwrap_err();
        assert!(matches!(err, RagError::ParseError { .. }));
    }

    #[test]
    fn missing_document_part_is_a_parse_error() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("other.xml", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = DocxLoader.load(&bytes, "empty.docx").unwrap_err();
        assert!(matches!(err, RagError::ParseError { .. }));
    }
}
