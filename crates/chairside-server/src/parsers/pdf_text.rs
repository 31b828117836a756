//! Plain-text extraction from PDF exports
//!
//! Legacy reports arrive as print-formatted PDFs; everything downstream
//! works on the extracted text. Extraction failure is a hard error, the
//! dialect parsers never see partial text.

use super::ParserError;

/// Extract plain text from an in-memory PDF
pub fn extract(raw: &[u8]) -> Result<String, ParserError> {
    pdf_extract::extract_text_from_mem(raw)
        .map_err(|e| ParserError::PdfExtraction(e.to_string()))
}
