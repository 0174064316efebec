//! Core building blocks
//!
//! Error types, input opening, tag-list splitting and allele conversion.
//! Everything in `formats` is built on top of these.

pub mod alleles;
mod error;
pub mod io;
pub mod tags;

pub use alleles::{iupac_to_numeric, split_genotype, to_iupac, Bases};
pub use error::{
    AlleleError, AlleleResult, MetadataError, MetadataResult, RecordError, RecordResult, Result,
    TagParseError, VcfParserError,
};
pub use io::{
    detect_compression, open_vcf, CompressionFormat, IoStrategy, LineIterator, SmartReader,
    DEFAULT_BUFFER_SIZE, LARGE_BUFFER_SIZE, MMAP_THRESHOLD,
};
pub use tags::{split_to_dict, TagMap};
