//! Format parsers for uploaded legacy exports
//!
//! A parser turns raw file bytes into staged records. Strategy
//! selection is keyed on the detected file type, with the source system
//! breaking the tie for PDFs since print-formatted reports have no
//! self-describing structure.

pub mod csv;
pub mod day_sheet;
pub mod financial_summary;
pub mod json;
pub mod pdf_text;

use crate::features::ingestion::types::{FileType, SourceSystem};
use serde_json::{json, Value};
use thiserror::Error;

/// One parsed record, ready for staging
///
/// Records that could not be fully parsed still carry their raw payload
/// plus an error marker, so review happens in the staging table rather
/// than by re-reading the file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub payload: Value,
    pub error: Option<String>,
}

impl ParsedRecord {
    pub fn ok(payload: Value) -> Self {
        Self {
            payload,
            error: None,
        }
    }

    pub fn with_error(payload: Value, error: impl Into<String>) -> Self {
        Self {
            payload,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(FileType),

    #[error("PDF text extraction failed: {0}")]
    PdfExtraction(String),
}

/// Which parser handles a given upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserStrategy {
    Csv,
    Json,
    /// Transaction-per-line ledger dialect (Dentrix day sheets)
    DayLedger,
    /// Labelled-metrics dialect (Eaglesoft financial summaries)
    FinancialSummary,
    /// PDF from a source with no dedicated dialect; stages the raw text
    RawText,
}

impl ParserStrategy {
    /// Select the parser for a (file type, source system) pair
    pub fn select(file_type: FileType, source: SourceSystem) -> Result<Self, ParserError> {
        match file_type {
            FileType::Csv => Ok(ParserStrategy::Csv),
            FileType::Json | FileType::Txt => Ok(ParserStrategy::Json),
            FileType::Pdf => Ok(match source {
                SourceSystem::Dentrix => ParserStrategy::DayLedger,
                SourceSystem::Eaglesoft => ParserStrategy::FinancialSummary,
                _ => ParserStrategy::RawText,
            }),
            FileType::Unknown => Err(ParserError::UnsupportedFileType(file_type)),
        }
    }

    /// Run the selected parser over raw file bytes
    pub fn parse(self, raw: &[u8]) -> Result<Vec<ParsedRecord>, ParserError> {
        match self {
            ParserStrategy::Csv => Ok(csv::parse(raw)),
            ParserStrategy::Json => Ok(json::parse(raw)),
            ParserStrategy::DayLedger => Ok(day_sheet::parse(&pdf_text::extract(raw)?)),
            ParserStrategy::FinancialSummary => {
                Ok(financial_summary::parse(&pdf_text::extract(raw)?))
            },
            ParserStrategy::RawText => {
                let text = pdf_text::extract(raw)?;
                Ok(vec![ParsedRecord::ok(json!({ "text": text }))])
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_selection_by_file_type() {
        let s = SourceSystem::Dentalintel;
        assert_eq!(
            ParserStrategy::select(FileType::Csv, s).unwrap(),
            ParserStrategy::Csv
        );
        assert_eq!(
            ParserStrategy::select(FileType::Json, s).unwrap(),
            ParserStrategy::Json
        );
        assert_eq!(
            ParserStrategy::select(FileType::Txt, s).unwrap(),
            ParserStrategy::Json
        );
    }

    #[test]
    fn test_pdf_dialect_keyed_on_source_system() {
        assert_eq!(
            ParserStrategy::select(FileType::Pdf, SourceSystem::Dentrix).unwrap(),
            ParserStrategy::DayLedger
        );
        assert_eq!(
            ParserStrategy::select(FileType::Pdf, SourceSystem::Eaglesoft).unwrap(),
            ParserStrategy::FinancialSummary
        );
        assert_eq!(
            ParserStrategy::select(FileType::Pdf, SourceSystem::Adp).unwrap(),
            ParserStrategy::RawText
        );
    }

    #[test]
    fn test_unknown_file_type_rejected() {
        let err = ParserStrategy::select(FileType::Unknown, SourceSystem::Dentrix).unwrap_err();
        assert!(matches!(err, ParserError::UnsupportedFileType(_)));
    }

    #[test]
    fn test_csv_dispatch() {
        let records = ParserStrategy::Csv.parse(b"a,b\n1,2\n").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload["a"], "1");
    }
}
