use super::{DocumentFormat, ExtractionError};

/// Decode plain text as strict UTF-8.
pub fn extract(source: &[u8]) -> Result<String, ExtractionError> {
    std::str::from_utf8(source)
        .map(str::to_owned)
        .map_err(|e| ExtractionError::decoding(DocumentFormat::Txt, e))
}
