//! Raw text extraction from OOXML word-processing documents (.docx).
//!
//! A .docx file is a zip container; the body lives in `word/document.xml`.
//! Only run text is collected. Styles, numbering and embedded media are ignored.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("not a valid OOXML container: {0}")]
    Container(#[from] zip::result::ZipError),

    #[error("failed to read {DOCUMENT_PART}: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed {DOCUMENT_PART}: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Returns the document's raw text, one line per paragraph.
pub fn extract_raw_text(content: &[u8]) -> Result<String, DocxError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(content))?;
    let mut xml = String::new();
    archive.by_name(DOCUMENT_PART)?.read_to_string(&mut xml)?;
    document_xml_to_text(&xml)
}

fn document_xml_to_text(xml: &str) -> Result<String, DocxError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_run_text => text.push_str(&e.unescape()?),
            Event::CData(e) if in_run_text => {
                text.push_str(&String::from_utf8_lossy(&e.into_inner()))
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}
