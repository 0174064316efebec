//! VCF record decoding and the streaming parser
//!
//! A [`VcfParser`] holds two independent cursors over the same input: one is
//! consumed by [`VcfParser::parse_metadata`], the other by
//! [`VcfParser::parse_records`], so the header can be parsed once while
//! records stream forward without rewinding.
//!
//! Data lines become [`Record`]s. Only the tab split happens eagerly; the
//! per-sample `FORMAT` mapping is built on first use and cached.

use crate::core::alleles::{split_genotype, to_iupac, Bases, MISSING};
use crate::core::io::{open_vcf, IoStrategy, LineIterator, SmartReader};
use crate::core::tags::TagMap;
use crate::core::{MetadataError, RecordError, RecordResult, Result};
use crate::formats::genotype::GenotypeProperty;
use crate::formats::header::{parse_column_header, parse_header, Metadata, FIXED_COLUMNS};
use indexmap::IndexMap;
use log::{debug, trace, warn};
use memchr::memchr_iter;
use serde::Serialize;
use std::cell::OnceCell;
use std::fmt;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

/// sample name -> {FORMAT tag -> value}
pub type SampleMap = IndexMap<String, TagMap>;

/// One decoded data line
#[derive(Debug, Clone)]
pub struct Record {
    line: String,
    pub chrom: String,
    /// 1-based position
    pub pos: u64,
    pub id: String,
    pub ref_allele: String,
    pub alt: Vec<String>,
    pub qual: String,
    pub filter: Vec<String>,
    /// Raw INFO column
    pub info: String,
    pub format: Vec<String>,
    /// Sample names from the column header, shared between records
    pub sample_names: Arc<[String]>,
    /// Raw sample columns, one per sample
    pub sample_values: Vec<String>,
    ref_alt: Vec<String>,
    mapped: OnceCell<SampleMap>,
}

/// Split a line on tabs, returning field slices
fn split_fields(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut fields = Vec::with_capacity(16);
    let mut start = 0;
    for tab in memchr_iter(b'\t', bytes) {
        fields.push(&line[start..tab]);
        start = tab + 1;
    }
    fields.push(&line[start..]);
    fields
}

fn parse_pos(value: &str, line: &str) -> RecordResult<u64> {
    value.parse().map_err(|_| RecordError::InvalidPosition {
        value: value.to_string(),
        line: line.to_string(),
    })
}

impl Record {
    /// Decode a data line against the full column header (`CHROM..FORMAT`
    /// followed by sample names)
    pub fn decode(line: &str, record_keys: &[String]) -> RecordResult<Self> {
        let sample_names: Arc<[String]> = record_keys
            .iter()
            .skip(FIXED_COLUMNS.len())
            .cloned()
            .collect();
        Self::decode_with_samples(line, sample_names)
    }

    /// Decode a data line with an already shared list of sample names
    pub fn decode_with_samples(line: &str, sample_names: Arc<[String]>) -> RecordResult<Self> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            return Err(RecordError::EmptyLine);
        }

        let fields = split_fields(line);
        if fields.len() < FIXED_COLUMNS.len() {
            return Err(RecordError::TooFewFields {
                expected: FIXED_COLUMNS.len(),
                found: fields.len(),
                line: line.to_string(),
            });
        }

        let pos = parse_pos(fields[1], line)?;
        let ref_allele = fields[3].to_string();
        let alt: Vec<String> = fields[4].split(',').map(str::to_string).collect();

        let mut ref_alt = Vec::with_capacity(alt.len() + 1);
        ref_alt.push(ref_allele.clone());
        ref_alt.extend(alt.iter().cloned());

        Ok(Self {
            line: line.to_string(),
            chrom: fields[0].to_string(),
            pos,
            id: fields[2].to_string(),
            ref_allele,
            alt,
            qual: fields[5].to_string(),
            filter: fields[6].split(',').map(str::to_string).collect(),
            info: fields[7].to_string(),
            format: fields[8].split(':').map(str::to_string).collect(),
            sample_names,
            sample_values: fields[9..].iter().map(|s| s.to_string()).collect(),
            ref_alt,
            mapped: OnceCell::new(),
        })
    }

    /// The original data line
    pub fn raw(&self) -> &str {
        &self.line
    }

    /// `[REF, ALT1, ALT2, ...]`, indexed by numeric genotype codes
    pub fn ref_alt(&self) -> &[String] {
        &self.ref_alt
    }

    /// Genotype classification view of this record
    pub fn genotype_property(&self) -> GenotypeProperty<'_> {
        GenotypeProperty::new(self)
    }

    /// Sample -> {tag -> value}, built on first call
    ///
    /// A sample with fewer values than FORMAT tags is padded with `.`;
    /// a sample column absent from the line is all `.`.
    pub fn mapped_format_to_sample(&self) -> &SampleMap {
        self.mapped.get_or_init(|| self.build_sample_map())
    }

    fn build_sample_map(&self) -> SampleMap {
        if self.sample_values.len() > self.sample_names.len() {
            warn!(
                "{}:{} has {} sample columns but the header names {}; extra columns ignored",
                self.chrom,
                self.pos,
                self.sample_values.len(),
                self.sample_names.len()
            );
        }

        let mut mapped = SampleMap::with_capacity(self.sample_names.len());
        for (i, name) in self.sample_names.iter().enumerate() {
            let raw = self.sample_values.get(i).map(String::as_str).unwrap_or(MISSING);
            let values: Vec<&str> = raw.split(':').collect();
            if values.len() < self.format.len() {
                warn!(
                    "{}:{} sample {} has {} of {} FORMAT values, padding with '.'",
                    self.chrom,
                    self.pos,
                    name,
                    values.len(),
                    self.format.len()
                );
            }

            let tags: TagMap = self
                .format
                .iter()
                .enumerate()
                .map(|(j, tag)| (tag.clone(), values.get(j).copied().unwrap_or(MISSING).to_string()))
                .collect();
            mapped.insert(name.clone(), tags);
        }
        mapped
    }

    /// Raw value of one FORMAT tag for one sample
    pub fn tag_value(&self, sample: &str, tag: &str) -> RecordResult<&str> {
        let tags = self
            .mapped_format_to_sample()
            .get(sample)
            .ok_or_else(|| RecordError::UnknownSample(sample.to_string()))?;
        tags.get(tag)
            .map(String::as_str)
            .ok_or_else(|| RecordError::UnknownFormatTag { tag: tag.to_string() })
    }

    fn resolve_samples<'a>(&'a self, samples: &[&'a str]) -> Vec<&'a str> {
        if samples.is_empty() {
            self.sample_names.iter().map(String::as_str).collect()
        } else {
            samples.to_vec()
        }
    }

    /// INFO as an ordered map; flags map to `.`
    ///
    /// An empty `keys` slice returns every entry.
    pub fn get_info_as_dict(&self, keys: &[&str]) -> TagMap {
        let mut info = TagMap::new();
        if self.info == MISSING {
            return info;
        }

        for token in self.info.split(';').filter(|t| !t.is_empty()) {
            let (key, value) = token.split_once('=').unwrap_or((token, MISSING));
            if keys.is_empty() || keys.contains(&key) {
                info.insert(key.to_string(), value.to_string());
            }
        }
        info
    }

    /// Mapped sample view restricted to `samples` and `formats`
    ///
    /// Empty slices select everything. Each tag in `convert_to_iupac` adds a
    /// `<tag>_iupac` entry with the base-converted value.
    pub fn get_format_to_sample_map(
        &self,
        samples: &[&str],
        formats: &[&str],
        convert_to_iupac: &[&str],
    ) -> RecordResult<SampleMap> {
        for tag in formats.iter().chain(convert_to_iupac) {
            if !self.format.iter().any(|f| f == tag) {
                return Err(RecordError::UnknownFormatTag { tag: tag.to_string() });
            }
        }

        let mapped = self.mapped_format_to_sample();
        let mut out = SampleMap::new();
        for sample in self.resolve_samples(samples) {
            let tags = mapped
                .get(sample)
                .ok_or_else(|| RecordError::UnknownSample(sample.to_string()))?;

            let mut selected: TagMap = if formats.is_empty() {
                tags.clone()
            } else {
                formats
                    .iter()
                    .filter_map(|f| tags.get_key_value(*f))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            };

            for tag in convert_to_iupac {
                let value = tags.get(*tag).map(String::as_str).unwrap_or(MISSING);
                let converted = to_iupac(&self.ref_alt, value, Bases::Iupac)?;
                selected.insert(format!("{}_iupac", tag), converted);
            }

            out.insert(sample.to_string(), selected);
        }
        Ok(out)
    }

    /// Raw values of `tag` for the given samples (all samples when empty)
    pub fn get_tag_values_from_samples(&self, tag: &str, samples: &[&str]) -> RecordResult<Vec<&str>> {
        self.resolve_samples(samples)
            .into_iter()
            .map(|s| self.tag_value(s, tag))
            .collect()
    }

    /// Per-allele tokens of `tag` for the given samples
    pub fn split_tag_from_samples(&self, tag: &str, samples: &[&str]) -> RecordResult<Vec<Vec<&str>>> {
        Ok(self
            .get_tag_values_from_samples(tag, samples)?
            .into_iter()
            .map(split_genotype)
            .collect())
    }

    /// Values of `tag` for the given samples, rendered per `bases`
    pub fn get_mapped_tag_list(&self, samples: &[&str], tag: &str, bases: Bases) -> RecordResult<Vec<String>> {
        self.get_tag_values_from_samples(tag, samples)?
            .into_iter()
            .map(|v| to_iupac(&self.ref_alt, v, bases).map_err(RecordError::from))
            .collect()
    }

    /// Every column by name, INFO as a map, and the mapped samples
    pub fn map_records_long(&self, convert_to_iupac: &[&str]) -> RecordResult<LongRecord> {
        let mut fields = IndexMap::new();
        let values = split_fields(&self.line);
        for (i, value) in values.iter().enumerate() {
            let key = FIXED_COLUMNS
                .get(i)
                .map(|k| k.to_string())
                .or_else(|| self.sample_names.get(i - FIXED_COLUMNS.len()).cloned());
            if let Some(key) = key {
                fields.insert(key, value.to_string());
            }
        }

        Ok(LongRecord {
            fields,
            info: self.get_info_as_dict(&[]),
            samples: self.get_format_to_sample_map(&[], &[], convert_to_iupac)?,
        })
    }

    /// Turn a mapped sample view back into `(FORMAT, tab-joined samples)`
    ///
    /// The FORMAT column is taken from the first sample's keys.
    pub fn unmap_fmt_samples(&self, mapped: &SampleMap) -> (String, String) {
        let format = mapped
            .values()
            .next()
            .map(|tags| tags.keys().map(String::as_str).collect::<Vec<_>>().join(":"))
            .unwrap_or_else(|| self.format.join(":"));

        let samples = self
            .sample_names
            .iter()
            .filter_map(|name| mapped.get(name))
            .map(|tags| tags.values().map(String::as_str).collect::<Vec<_>>().join(":"))
            .collect::<Vec<_>>()
            .join("\t");

        (format, samples)
    }

    /// REF is a single base and at least one ALT is a single base
    pub fn has_snp(&self) -> bool {
        self.ref_allele.len() == 1
            && self.alt.iter().any(|a| is_sequence_allele(a) && a.len() == 1)
    }

    /// At least one sequence ALT differs in length from REF
    pub fn has_indel(&self) -> bool {
        self.alt
            .iter()
            .any(|a| is_sequence_allele(a) && a.len() != self.ref_allele.len())
    }
}

/// Excludes missing (`.`), overlapping deletion (`*`), symbolic (`<DEL>`)
/// and breakend alleles
fn is_sequence_allele(allele: &str) -> bool {
    allele != MISSING
        && allele != "*"
        && !allele.starts_with('<')
        && !allele.contains(['[', ']'])
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// Record with every column keyed by name
#[derive(Debug, Clone, Serialize)]
pub struct LongRecord {
    /// CHROM..FORMAT and raw sample columns
    pub fields: IndexMap<String, String>,
    #[serde(rename = "INFO")]
    pub info: TagMap,
    pub samples: SampleMap,
}

/// Chromosome / position predicate applied during the scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub chrom: Option<String>,
    /// Inclusive `(start, end)` on POS
    pub pos_range: Option<(u64, u64)>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chrom(mut self, chrom: impl Into<String>) -> Self {
        self.chrom = Some(chrom.into());
        self
    }

    pub fn with_range(mut self, start: u64, end: u64) -> Self {
        self.pos_range = Some((start, end));
        self
    }

    pub fn is_active(&self) -> bool {
        self.chrom.is_some() || self.pos_range.is_some()
    }

    /// Check a raw data line, looking only at CHROM and POS
    pub fn matches_line(&self, line: &str) -> RecordResult<bool> {
        if !self.is_active() {
            return Ok(true);
        }

        let mut fields = line.splitn(3, '\t');
        let chrom = fields.next().unwrap_or("");
        if let Some(wanted) = &self.chrom {
            if chrom != wanted.as_str() {
                return Ok(false);
            }
        }

        if let Some((start, end)) = self.pos_range {
            let pos = match fields.next() {
                Some(value) => parse_pos(value, line)?,
                None => {
                    return Err(RecordError::TooFewFields {
                        expected: FIXED_COLUMNS.len(),
                        found: 1,
                        line: line.to_string(),
                    })
                }
            };
            return Ok(start <= pos && pos <= end);
        }

        Ok(true)
    }
}

/// Counters kept while streaming records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Non-empty data lines seen
    pub total: usize,
    /// Lines that passed the filter
    pub emitted: usize,
    /// Lines rejected by the filter
    pub skipped: usize,
}

/// Forward-only record stream
pub struct Records<R: BufRead> {
    lines: LineIterator<R>,
    sample_names: Arc<[String]>,
    record_keys: Vec<String>,
    filter: RecordFilter,
    stats: ScanStats,
}

impl<R: BufRead> Records<R> {
    /// Column header of the stream, `#` removed
    pub fn record_keys(&self) -> &[String] {
        &self.record_keys
    }

    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = RecordResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next_line()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            if line.is_empty() {
                continue;
            }
            self.stats.total += 1;

            match self.filter.matches_line(line) {
                Ok(true) => {}
                Ok(false) => {
                    self.stats.skipped += 1;
                    trace!("filtered out line {}", self.stats.total);
                    continue;
                }
                Err(e) => return Some(Err(e)),
            }

            self.stats.emitted += 1;
            return Some(Record::decode_with_samples(line, Arc::clone(&self.sample_names)));
        }
    }
}

/// VCF parser over two independent cursors of the same input
pub struct VcfParser<R: BufRead> {
    meta_reader: R,
    record_reader: R,
    metadata: Option<Metadata>,
    header_failed: bool,
}

impl VcfParser<SmartReader> {
    /// Open a plain or gzip VCF file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_path_with_strategy(path, IoStrategy::Auto)
    }

    pub fn from_path_with_strategy<P: AsRef<Path>>(path: P, strategy: IoStrategy) -> Result<Self> {
        let path = path.as_ref();
        let meta_reader = open_vcf(path, strategy)?;
        let record_reader = open_vcf(path, strategy)?;
        debug!("opened {} (compressed: {})", path.display(), meta_reader.is_compressed());
        Ok(Self::from_readers(meta_reader, record_reader))
    }
}

impl<'a> VcfParser<&'a [u8]> {
    /// Parse an in-memory VCF
    pub fn from_bytes(data: &'a [u8]) -> Self {
        Self::from_readers(data, data)
    }
}

impl<R: BufRead> VcfParser<R> {
    /// Build from two readers positioned at the start of the same VCF
    pub fn from_readers(meta_reader: R, record_reader: R) -> Self {
        Self {
            meta_reader,
            record_reader,
            metadata: None,
            header_failed: false,
        }
    }

    /// Parse the header block; later calls return the cached result
    ///
    /// The first failure is final: the metadata cursor is left mid-header,
    /// so every later call returns [`MetadataError::HeaderUnavailable`].
    pub fn parse_metadata(&mut self) -> Result<&Metadata> {
        if self.header_failed {
            return Err(MetadataError::HeaderUnavailable.into());
        }
        let metadata = match self.metadata.take() {
            Some(metadata) => metadata,
            None => match parse_header(&mut self.meta_reader) {
                Ok(metadata) => metadata,
                Err(e) => {
                    self.header_failed = true;
                    return Err(e.into());
                }
            },
        };
        Ok(self.metadata.insert(metadata))
    }

    /// Stream every record
    pub fn parse_records(self) -> Result<Records<R>> {
        self.parse_records_filtered(RecordFilter::default())
    }

    /// Stream records matching `filter`
    ///
    /// `##` lines are skipped; the next line must be the `#CHROM` header.
    pub fn parse_records_filtered(self, filter: RecordFilter) -> Result<Records<R>> {
        let mut lines = LineIterator::new(self.record_reader);

        let record_keys = loop {
            match lines.next_line() {
                None => return Err(MetadataError::MissingHeaderLine.into()),
                Some(line) => {
                    let line = line?;
                    if line.starts_with("##") {
                        continue;
                    }
                    if !line.starts_with('#') {
                        return Err(MetadataError::MissingHeaderLine.into());
                    }
                    break parse_column_header(line)?;
                }
            }
        };

        let sample_names: Arc<[String]> = record_keys
            .iter()
            .skip(FIXED_COLUMNS.len())
            .cloned()
            .collect();
        debug!("streaming records for {} samples, filter {:?}", sample_names.len(), filter);

        Ok(Records {
            lines,
            sample_names,
            record_keys,
            filter,
            stats: ScanStats::default(),
        })
    }
}
