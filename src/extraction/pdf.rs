use lopdf::Document;
use tracing::debug;

use super::{DocumentFormat, ExtractionError};

/// Extract the text of every page, in page order, with nothing inserted
/// between pages.
///
/// lopdf closes every text object with a line break; the one ending each
/// page fragment is dropped so pages join directly.
///
/// The call is atomic: if loading the document or any single page fails,
/// the text of pages already processed is discarded.
pub fn extract(source: &[u8]) -> Result<String, ExtractionError> {
    let document =
        Document::load_mem(source).map_err(|e| ExtractionError::decoding(DocumentFormat::Pdf, e))?;

    let pages = document.get_pages();
    debug!(page_count = pages.len(), "Extracting PDF text");

    let mut text = String::new();
    for page_number in pages.keys() {
        let page_text = document.extract_text(&[*page_number]).map_err(|e| {
            ExtractionError::decoding(DocumentFormat::Pdf, format!("page {}: {}", page_number, e))
        })?;
        text.push_str(strip_trailing_break(&page_text));
    }

    Ok(text)
}

fn strip_trailing_break(fragment: &str) -> &str {
    fragment
        .strip_suffix("\r\n")
        .or_else(|| fragment.strip_suffix('\n'))
        .unwrap_or(fragment)
}
