//! VCF writer
//!
//! Formats header and data lines in the same grammar the parser reads, so
//! anything written here parses back into identical metadata.

use crate::formats::header::Metadata;
use crate::formats::vcf::Record;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

const MISSING: &str = ".";

/// An INFO / FORMAT / FILTER definition
///
/// Number and Type default to `.`, Description to empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaDef<'a> {
    pub id: &'a str,
    pub number: &'a str,
    pub kind: &'a str,
    pub description: &'a str,
}

impl<'a> MetaDef<'a> {
    pub fn new(id: &'a str) -> Self {
        Self {
            id,
            number: MISSING,
            kind: MISSING,
            description: "",
        }
    }

    pub fn number(mut self, number: &'a str) -> Self {
        self.number = number;
        self
    }

    pub fn kind(mut self, kind: &'a str) -> Self {
        self.kind = kind;
        self
    }

    pub fn description(mut self, description: &'a str) -> Self {
        self.description = description;
        self
    }
}

fn escape_description(desc: &str) -> String {
    desc.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Line-oriented VCF writer
pub struct VcfWriter<W: Write> {
    out: W,
    lines: usize,
}

impl VcfWriter<BufWriter<File>> {
    /// Create (or truncate) `path`
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }

    /// Open `path` for appending, creating it if needed
    pub fn append<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> VcfWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, lines: 0 }
    }

    /// Lines written so far
    pub fn lines_written(&self) -> usize {
        self.lines
    }

    fn line(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    fn structured(&mut self, key: &str, def: &MetaDef<'_>) -> io::Result<()> {
        self.line(&format!(
            "##{}=<ID={},Number={},Type={},Description=\"{}\">",
            key,
            def.id,
            def.number,
            def.kind,
            escape_description(def.description)
        ))
    }

    /// `##key=value`, e.g. fileformat or reference
    pub fn add_normal_metadata(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.line(&format!("##{}={}", key, value))
    }

    pub fn add_info(&mut self, def: &MetaDef<'_>) -> io::Result<()> {
        self.structured("INFO", def)
    }

    pub fn add_format(&mut self, def: &MetaDef<'_>) -> io::Result<()> {
        self.structured("FORMAT", def)
    }

    /// `##FILTER=<ID=..,Description="..">`
    pub fn add_filter(&mut self, id: &str, description: &str) -> io::Result<()> {
        self.line(&format!(
            "##FILTER=<ID={},Description=\"{}\">",
            id,
            escape_description(description)
        ))
    }

    /// FILTER line carrying Number and Type as well
    pub fn add_filter_long(&mut self, def: &MetaDef<'_>) -> io::Result<()> {
        self.structured("FILTER", def)
    }

    pub fn add_contig(&mut self, id: &str, length: u64) -> io::Result<()> {
        self.line(&format!("##contig=<ID={},length={}>", id, length))
    }

    /// Replay a parsed header verbatim
    pub fn add_metadata(&mut self, meta: &Metadata) -> io::Result<()> {
        self.out.write_all(meta.raw_meta_data.as_bytes())?;
        self.lines += meta.raw_meta_data.lines().count();
        Ok(())
    }

    /// `#CHROM\tPOS...` column header
    pub fn add_header_line<S: AsRef<str>>(&mut self, record_keys: &[S]) -> io::Result<()> {
        let joined = record_keys.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("\t");
        if joined.starts_with('#') {
            self.line(&joined)
        } else {
            self.line(&format!("#{}", joined))
        }
    }

    /// One data line from its tab fields
    pub fn add_record_from_parts<S: AsRef<str>>(&mut self, parts: &[S]) -> io::Result<()> {
        let joined = parts.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("\t");
        self.line(&joined)
    }

    /// One data line from CHROM..FILTER (already tab-joined), INFO, FORMAT
    /// and the tab-joined sample columns
    pub fn add_record_value(
        &mut self,
        preheader: &str,
        info: &str,
        format: &str,
        samples: &str,
    ) -> io::Result<()> {
        self.add_record_from_parts(&[preheader, info, format, samples])
    }

    /// Write a decoded record unchanged
    pub fn add_record(&mut self, record: &Record) -> io::Result<()> {
        self.line(record.raw())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
