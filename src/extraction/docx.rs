use std::io::{Cursor, Read};

use once_cell::sync::Lazy;
use regex::Regex;
use zip::result::ZipError;
use zip::ZipArchive;

use super::{DocumentFormat, ExtractionError};

/// OOXML part holding the document body
pub const BODY_PART: &str = "word/document.xml";

// Non-greedy and line-bound: a tag broken across lines is left in place.
static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<.*?>").expect("markup pattern is valid"));

/// Read the body part of a DOCX archive and strip its markup.
///
/// XML entities such as `&amp;` are left as they are.
pub fn extract(source: &[u8]) -> Result<String, ExtractionError> {
    let body = read_body(source)?;
    Ok(strip_markup(&body))
}

fn read_body(source: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(source))
        .map_err(|e| ExtractionError::decoding(DocumentFormat::Docx, e))?;

    let mut entry = archive.by_name(BODY_PART).map_err(|e| match e {
        ZipError::FileNotFound => ExtractionError::Structural {
            format: DocumentFormat::Docx,
            part: BODY_PART.to_string(),
        },
        other => ExtractionError::decoding(DocumentFormat::Docx, other),
    })?;

    let mut raw = Vec::new();
    entry
        .read_to_end(&mut raw)
        .map_err(|e| ExtractionError::decoding(DocumentFormat::Docx, e))?;

    String::from_utf8(raw).map_err(|e| ExtractionError::decoding(DocumentFormat::Docx, e))
}

pub fn strip_markup(xml: &str) -> String {
    MARKUP.replace_all(xml, "").into_owned()
}
