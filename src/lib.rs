//! FastVcfParser - streaming VCF parser with genotype classification
//!
//! Decodes VCF headers and data lines into typed structures and classifies
//! each sample's genotype (hom-ref, hom-var, het-var, missing, phased) with
//! optional conversion of allele indices to REF/ALT bases.
//!
//! # Features
//!
//! - Plain and gzip/bgzip input, with the header and the records read
//!   through independent cursors
//! - Lazy per-sample FORMAT mapping, built only when a record is queried
//! - Linear chromosome / position range filtering
//! - VCF writer and JSON / table metadata export
//!
//! # Example
//!
//! ```no_run
//! use fast_vcfparser::{Bases, VcfParser};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut parser = VcfParser::from_path("sample.vcf.gz")?;
//! let meta = parser.parse_metadata()?;
//! println!("{} samples", meta.sample_names.len());
//!
//! for record in parser.parse_records()? {
//!     let record = record?;
//!     let het = record.genotype_property().is_hetvar("GT", Bases::Iupac)?;
//!     println!("{}:{} {:?}", record.chrom, record.pos, het);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use self::core::{
    iupac_to_numeric, split_to_dict, to_iupac, AlleleError, Bases, IoStrategy, MetadataError,
    RecordError, TagMap, TagParseError, VcfParserError,
};
pub use formats::{
    Classification, GenotypeClass, GenotypeProperty, Metadata, MetadataViewer, Record, RecordFilter,
    VcfParser, VcfWriter,
};
