//! VCF header (meta-information) parser
//!
//! Consumes the `##` meta lines and the `#CHROM` column header line of a VCF
//! file and produces a [`Metadata`] record.
//!
//! ```text
//! ##fileformat=VCFv4.2
//! ##INFO=<ID=DP,Number=1,Type=Integer,Description="Total Depth">
//! ##FORMAT=<ID=GT,Number=1,Type=String,Description="Genotype">
//! #CHROM  POS  ID  REF  ALT  QUAL  FILTER  INFO  FORMAT  sample1 ...
//! ```

use crate::core::io::LineIterator;
use crate::core::tags::{split_to_dict, unescape_quoted, TagMap};
use crate::core::{MetadataError, MetadataResult};
use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde::Serialize;
use std::io::BufRead;
use std::sync::LazyLock;

/// The nine fixed columns that precede the sample columns
pub const FIXED_COLUMNS: [&str; 9] = [
    "CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO", "FORMAT",
];

/// Columns a sites-only file (no FORMAT, no samples) must carry
const MIN_HEADER_COLUMNS: usize = 8;

static FORMAT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^##FORMAT=<ID=(?P<id>.+),\s*Number=(?P<number>-?\d+|\.|[AGR]),\s*Type=(?P<type>.+),\s*Description="(?P<desc>.*)">"#,
    )
    .expect("FORMAT regex is valid")
});

static META_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##(?P<key>.+?)=(?P<val>.+)").expect("meta regex is valid"));

static GVCF_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##GVCFBlock(?P<block>.*?)=").expect("GVCFBlock regex is valid"));

static GATK_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^##GATKCommandLine(?P<name>.*)=<ID=").expect("GATKCommandLine regex is valid")
});

/// Sample name together with its 1-based column number
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SamplePosition {
    pub name: String,
    pub position: usize,
}

/// Everything parsed from a VCF header
#[derive(Debug, Clone, Default, Serialize)]
pub struct Metadata {
    pub file_format: String,
    pub reference: Vec<String>,
    pub info_defs: Vec<TagMap>,
    pub format_defs: Vec<TagMap>,
    pub filter_defs: Vec<TagMap>,
    pub alt_defs: Vec<TagMap>,
    pub contig_defs: Vec<TagMap>,
    pub gvcf_blocks: Vec<TagMap>,
    pub gatk_commands: Vec<TagMap>,
    /// Unrecognized `##key=value` lines, one single-key map each
    pub other_lines: Vec<TagMap>,
    /// `{fileformat: ..}` and, for GVCF input, `{GVCF: "true"}`
    pub vcf_spec: Vec<TagMap>,
    pub sample_names: Vec<String>,
    pub sample_with_pos: Vec<SamplePosition>,
    /// Column header with the leading `#` removed
    pub record_keys: Vec<String>,
    pub is_gvcf: bool,
    /// All header lines verbatim, newline terminated
    #[serde(skip)]
    pub raw_meta_data: String,
}

impl Metadata {
    pub fn sample_count(&self) -> usize {
        self.sample_names.len()
    }

    /// Find an INFO definition by ID
    pub fn info_def(&self, id: &str) -> Option<&TagMap> {
        find_by_id(&self.info_defs, id)
    }

    /// Find a FORMAT definition by ID
    pub fn format_def(&self, id: &str) -> Option<&TagMap> {
        find_by_id(&self.format_defs, id)
    }

    /// Find a contig definition by ID
    pub fn contig_def(&self, id: &str) -> Option<&TagMap> {
        find_by_id(&self.contig_defs, id)
    }
}

fn find_by_id<'a>(defs: &'a [TagMap], id: &str) -> Option<&'a TagMap> {
    defs.iter()
        .find(|d| d.get("ID").map(String::as_str) == Some(id))
}

fn single(key: &str, value: &str) -> TagMap {
    let mut map = TagMap::new();
    map.insert(key.to_string(), value.to_string());
    map
}

/// Incremental header parser, fed one line at a time
#[derive(Debug, Default)]
pub struct MetadataParser {
    meta: Metadata,
    has_file_format: bool,
    has_header_line: bool,
    lines: usize,
}

impl MetadataParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one header line (with or without its trailing newline)
    pub fn parse_line(&mut self, line: &str) -> MetadataResult<()> {
        let line = line.trim_end_matches(['\n', '\r']);
        self.meta.raw_meta_data.push_str(line);
        self.meta.raw_meta_data.push('\n');
        self.lines += 1;

        if line.starts_with("##") {
            self.parse_meta_line(line.trim_end())
        } else {
            self.parse_header_line(line)
        }
    }

    fn parse_meta_line(&mut self, line: &str) -> MetadataResult<()> {
        let body = &line[2..];
        let (key, value) = match body.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (body, None),
        };

        match key {
            "fileformat" => {
                let value = non_empty(value)
                    .ok_or_else(|| MetadataError::MissingFileFormat { line: line.to_string() })?;
                self.meta.file_format = value.to_string();
                self.meta.vcf_spec.push(single("fileformat", value));
                self.has_file_format = true;
            }
            "reference" => {
                let value = non_empty(value)
                    .ok_or_else(|| MetadataError::MissingReference { line: line.to_string() })?;
                self.meta.reference.push(value.to_string());
            }
            "INFO" => {
                let tags = tag_list(line, value)?;
                self.meta.info_defs.push(tags);
            }
            "FILTER" => {
                let tags = tag_list(line, value)?;
                self.meta.filter_defs.push(tags);
            }
            "contig" => {
                let tags = tag_list(line, value)?;
                self.meta.contig_defs.push(tags);
            }
            "ALT" => {
                let tags = tag_list(line, value)?;
                self.meta.alt_defs.push(tags);
            }
            "FORMAT" => {
                let tags = parse_format_line(line)?;
                self.meta.format_defs.push(tags);
            }
            _ if key.starts_with("GVCF") => {
                if !self.meta.is_gvcf {
                    self.meta.is_gvcf = true;
                    self.meta.vcf_spec.push(single("GVCF", "true"));
                }
                let block = parse_gvcf_block(line)?;
                self.meta.gvcf_blocks.push(block);
            }
            _ if key.starts_with("GATKCommandLine") => {
                let command = parse_gatk_command(line)?;
                self.meta.gatk_commands.push(command);
            }
            _ => {
                let caps = META_LINE
                    .captures(line)
                    .ok_or_else(|| MetadataError::MalformedMeta { line: line.to_string() })?;
                self.meta.other_lines.push(single(&caps["key"], &caps["val"]));
            }
        }

        Ok(())
    }

    fn parse_header_line(&mut self, line: &str) -> MetadataResult<()> {
        let keys = parse_column_header(line)?;

        self.meta.sample_names = keys.iter().skip(FIXED_COLUMNS.len()).cloned().collect();
        self.meta.sample_with_pos = self
            .meta
            .sample_names
            .iter()
            .enumerate()
            .map(|(i, name)| SamplePosition {
                name: name.clone(),
                position: FIXED_COLUMNS.len() + 1 + i,
            })
            .collect();
        self.meta.record_keys = keys;
        self.has_header_line = true;
        Ok(())
    }

    /// Finish parsing; a header needs both a fileformat and a `#CHROM` line
    pub fn finish(self) -> MetadataResult<Metadata> {
        if !self.has_file_format {
            return Err(MetadataError::NoFileFormat);
        }
        if !self.has_header_line {
            return Err(MetadataError::MissingHeaderLine);
        }
        debug!(
            "parsed {} header lines, {} samples",
            self.lines,
            self.meta.sample_names.len()
        );
        Ok(self.meta)
    }
}

/// Split the `#CHROM` line into record keys, checking the fixed columns
pub fn parse_column_header(line: &str) -> MetadataResult<Vec<String>> {
    let keys: Vec<String> = line
        .trim_end_matches(['\n', '\r'])
        .trim_start_matches('#')
        .split('\t')
        .map(str::to_string)
        .collect();

    let fixed = keys.len().min(FIXED_COLUMNS.len());
    if keys.len() < MIN_HEADER_COLUMNS
        || keys[..fixed].iter().zip(FIXED_COLUMNS.iter()).any(|(k, f)| k != f)
    {
        return Err(MetadataError::MalformedHeaderLine { line: line.to_string() });
    }
    Ok(keys)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn tag_list(line: &str, value: Option<&str>) -> MetadataResult<TagMap> {
    let value = value.ok_or_else(|| MetadataError::MalformedMeta { line: line.to_string() })?;
    split_to_dict(value).map_err(|source| MetadataError::Tag {
        line: line.to_string(),
        source,
    })
}

fn parse_format_line(line: &str) -> MetadataResult<TagMap> {
    let caps = FORMAT_LINE
        .captures(line)
        .ok_or_else(|| MetadataError::MalformedFormat { line: line.to_string() })?;

    let mut tags = TagMap::new();
    for (key, group) in [("ID", "id"), ("Number", "number"), ("Type", "type")] {
        tags.insert(key.to_string(), caps[group].to_string());
    }
    // Same unescaping as the quoted values of INFO / FILTER lines
    tags.insert("Description".to_string(), unescape_quoted(&caps["desc"]));
    Ok(tags)
}

/// `##GVCFBlock55-56=minGQ=55(inclusive),maxGQ=56(exclusive)`
fn parse_gvcf_block(line: &str) -> MetadataResult<TagMap> {
    let caps = GVCF_BLOCK
        .captures(line)
        .ok_or_else(|| MetadataError::MalformedGvcfBlock { line: line.to_string() })?;
    let prefix_len = caps.get(0).map_or(0, |m| m.end());
    let block = caps["block"].to_string();

    let rest = line[prefix_len..].trim_end_matches('>');
    let parsed = split_to_dict(rest).map_err(|source| MetadataError::Tag {
        line: line.to_string(),
        source,
    })?;

    let mut tags = TagMap::with_capacity(parsed.len() + 1);
    tags.insert("Block".to_string(), block);
    tags.extend(parsed);
    Ok(tags)
}

/// `##GATKCommandLine.HaplotypeCaller=<ID=HaplotypeCaller,CommandLine="...">`
fn parse_gatk_command(line: &str) -> MetadataResult<TagMap> {
    let caps = GATK_COMMAND
        .captures(line)
        .ok_or_else(|| MetadataError::MalformedGatkCommand { line: line.to_string() })?;
    // Keep the "ID=" that the pattern matched
    let start = caps.get(0).map_or(0, |m| m.end()) - "ID=".len();

    split_to_dict(&line[start..]).map_err(|source| MetadataError::Tag {
        line: line.to_string(),
        source,
    })
}

/// Parse header lines from an iterator, stopping at the first non-`#` line
pub fn parse_header_lines<'a, I>(lines: I) -> MetadataResult<Metadata>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut parser = MetadataParser::new();
    for line in lines.into_iter().take_while(|l| l.starts_with('#')) {
        parser.parse_line(line)?;
    }
    parser.finish()
}

/// Parse the header block of a reader
///
/// Only `#`-prefixed lines are consumed; the reader is left positioned at
/// the first data line.
pub fn parse_header<R: BufRead>(reader: R) -> MetadataResult<Metadata> {
    let mut lines = LineIterator::new(reader);
    let mut parser = MetadataParser::new();

    while lines.peek_byte()? == Some(b'#') {
        match lines.next_line() {
            Some(line) => parser.parse_line(line?)?,
            None => break,
        }
    }

    parser.finish()
}

/// Group a list of definitions by inner key: `[{ID: a}, {ID: b}]` -> `{ID: [a, b]}`
pub fn group_by_key(defs: &[TagMap]) -> IndexMap<String, Vec<String>> {
    let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
    for def in defs {
        for (key, value) in def {
            grouped.entry(key.clone()).or_default().push(value.clone());
        }
    }
    grouped
}
