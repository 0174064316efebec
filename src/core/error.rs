//! Error types for FastVcfParser
//!
//! Defines all error types used throughout the library. Structural problems
//! carry the offending raw line so the caller can report it verbatim.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for FastVcfParser operations
#[derive(Debug, Error)]
pub enum VcfParserError {
    /// Header (meta-information) parsing errors
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Data line decoding errors
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// Allele index / base conversion errors
    #[error("Allele error: {0}")]
    Allele(#[from] AlleleError),

    /// Input file does not exist
    #[error("VCF file not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while splitting a `<key=value,...>` tag list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagParseError {
    /// A top-level token has no `=`
    #[error("tag token has no '=': '{token}'")]
    MissingEquals { token: String },

    /// A quoted value is never closed
    #[error("no closing quotation in tag list: {input}")]
    UnterminatedQuote { input: String },
}

/// Errors that can occur while parsing the VCF header block
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("fileformat must have a value: {line}")]
    MissingFileFormat { line: String },

    #[error("header has no ##fileformat line")]
    NoFileFormat,

    #[error("reference value missing: {line}")]
    MissingReference { line: String },

    #[error("malformed FORMAT line: {line}")]
    MalformedFormat { line: String },

    #[error("malformed metadata line: {line}")]
    MalformedMeta { line: String },

    #[error("malformed GVCFBlock line: {line}")]
    MalformedGvcfBlock { line: String },

    #[error("malformed GATKCommandLine line: {line}")]
    MalformedGatkCommand { line: String },

    /// `#CHROM` line whose fixed columns are not CHROM..FORMAT
    #[error("malformed column header line: {line}")]
    MalformedHeaderLine { line: String },

    #[error("invalid tag list in line {line}: {source}")]
    Tag {
        line: String,
        #[source]
        source: TagParseError,
    },

    #[error("file does not contain the #CHROM record header line")]
    MissingHeaderLine,

    /// An earlier `parse_metadata` call failed after consuming part of the header
    #[error("header parsing already failed on this parser")]
    HeaderUnavailable,

    #[error("I/O error while reading header: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while decoding or querying a data line
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Empty line")]
    EmptyLine,

    #[error("Too few fields: expected at least {expected}, found {found}: {line}")]
    TooFewFields {
        expected: usize,
        found: usize,
        line: String,
    },

    #[error("Invalid position '{value}' in record: {line}")]
    InvalidPosition { value: String, line: String },

    #[error("Sample '{0}' is not present in the record")]
    UnknownSample(String),

    #[error("The format tag '{tag}' is not available in the VCF record")]
    UnknownFormatTag { tag: String },

    #[error(transparent)]
    Allele(#[from] AlleleError),

    #[error("I/O error while reading records: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by numeric <-> base genotype conversion
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlleleError {
    #[error("invalid allele index '{token}'")]
    InvalidIndex { token: String },

    #[error("allele index {index} out of range for {len} REF/ALT alleles")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("base '{base}' is not among the REF/ALT alleles")]
    UnknownBase { base: String },

    #[error("unknown bases mode '{value}': expected 'numeric' or 'iupac'")]
    UnknownBasesMode { value: String },
}

/// Result type alias for FastVcfParser operations
pub type Result<T> = std::result::Result<T, VcfParserError>;

/// Result type alias for header parsing
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;

/// Result type alias for record decoding and queries
pub type RecordResult<T> = std::result::Result<T, RecordError>;

/// Result type alias for allele conversion
pub type AlleleResult<T> = std::result::Result<T, AlleleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_error_carries_line() {
        let err = MetadataError::MissingFileFormat {
            line: "##fileformat=".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("fileformat must have a value"));
        assert!(msg.contains("##fileformat="));
    }

    #[test]
    fn test_allele_error_converts_into_record_error() {
        let err: RecordError = AlleleError::IndexOutOfRange { index: 3, len: 2 }.into();
        assert!(matches!(err, RecordError::Allele(AlleleError::IndexOutOfRange { .. })));
        assert_eq!(err.to_string(), "allele index 3 out of range for 2 REF/ALT alleles");
    }

    #[test]
    fn test_top_level_wraps_component_errors() {
        let err: VcfParserError = MetadataError::MissingHeaderLine.into();
        assert!(err.to_string().starts_with("Metadata error:"));

        let err: VcfParserError = RecordError::EmptyLine.into();
        assert_eq!(err.to_string(), "Record error: Empty line");
    }
}
