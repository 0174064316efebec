//! VCF format components
//!
//! Header parsing, record decoding, genotype classification, writing and
//! metadata export.

pub mod genotype;
pub mod header;
pub mod metaview;
pub mod vcf;
pub mod writer;

pub use genotype::{classify_tokens, classify_value, Classification, GenotypeClass, GenotypeProperty, SampleValues};
pub use header::{parse_header, parse_header_lines, Metadata, MetadataParser, SamplePosition, FIXED_COLUMNS};
pub use metaview::MetadataViewer;
pub use vcf::{LongRecord, Record, RecordFilter, Records, SampleMap, ScanStats, VcfParser};
pub use writer::{MetaDef, VcfWriter};
