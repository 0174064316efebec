//! Metadata export
//!
//! Renders a parsed [`Metadata`] as JSON, as a tab-separated table, or as a
//! grouped dictionary (`{ID: [..], Number: [..], ..}` per section).

use crate::core::tags::TagMap;
use crate::formats::header::{group_by_key, Metadata};
use indexmap::IndexMap;
use log::{debug, info};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// One exported section
#[derive(Debug, Clone, PartialEq)]
enum Section {
    Strings(Vec<String>),
    Maps(Vec<TagMap>),
}

impl Section {
    fn is_empty(&self) -> bool {
        match self {
            Section::Strings(v) => v.is_empty(),
            Section::Maps(v) => v.is_empty(),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Section::Strings(v) => Value::from(v.clone()),
            Section::Maps(v) => Value::Array(
                v.iter()
                    .map(|m| {
                        Value::Object(
                            m.iter()
                                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                                .collect(),
                        )
                    })
                    .collect(),
            ),
        }
    }
}

/// Sections written one key/value block per item
const PER_ITEM_SECTIONS: [&str; 2] = ["VCFspec", "Other"];

/// Read-only exporter over parsed metadata
pub struct MetadataViewer<'a> {
    meta: &'a Metadata,
}

impl<'a> MetadataViewer<'a> {
    pub fn new(meta: &'a Metadata) -> Self {
        Self { meta }
    }

    fn sections(&self) -> Vec<(&'static str, Section)> {
        let m = self.meta;
        let samples = m
            .sample_with_pos
            .iter()
            .map(|s| {
                let mut map = TagMap::new();
                map.insert("name".to_string(), s.name.clone());
                map.insert("position".to_string(), s.position.to_string());
                map
            })
            .collect();

        vec![
            ("VCFspec", Section::Maps(m.vcf_spec.clone())),
            ("FORMAT", Section::Maps(m.format_defs.clone())),
            ("INFO", Section::Maps(m.info_defs.clone())),
            ("FILTER", Section::Maps(m.filter_defs.clone())),
            ("ALT", Section::Maps(m.alt_defs.clone())),
            ("contig", Section::Maps(m.contig_defs.clone())),
            ("reference", Section::Strings(m.reference.clone())),
            ("GATKCommandLine", Section::Maps(m.gatk_commands.clone())),
            ("GVCFBlock", Section::Maps(m.gvcf_blocks.clone())),
            ("Other", Section::Maps(m.other_lines.clone())),
            ("samples", Section::Maps(samples)),
        ]
    }

    /// Every section as JSON values, in export order
    pub fn to_ordered_dict(&self) -> IndexMap<String, Value> {
        self.sections()
            .into_iter()
            .map(|(key, section)| (key.to_string(), section.to_value()))
            .collect()
    }

    /// Per section, values grouped by inner key
    pub fn to_grouped_dict(&self) -> IndexMap<String, IndexMap<String, Vec<String>>> {
        self.sections()
            .into_iter()
            .map(|(key, section)| {
                let grouped = match section {
                    Section::Strings(values) => {
                        let mut single = IndexMap::new();
                        single.insert(key.to_string(), values);
                        single
                    }
                    Section::Maps(maps) => group_by_key(&maps),
                };
                (key.to_string(), grouped)
            })
            .collect()
    }

    pub fn write_json<W: Write>(&self, mut out: W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut out, &self.to_ordered_dict())?;
        out.write_all(b"\n")
    }

    pub fn write_grouped<W: Write>(&self, mut out: W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut out, &self.to_grouped_dict())?;
        out.write_all(b"\n")
    }

    /// Tab-separated rendering; empty sections are left out
    pub fn write_table<W: Write>(&self, mut out: W) -> io::Result<()> {
        for (key, section) in self.sections() {
            if section.is_empty() {
                continue;
            }
            write_section(&mut out, key, &section)?;
        }
        Ok(())
    }

    /// Write `<prefix>.json`
    pub fn save_as_json<P: AsRef<Path>>(&self, prefix: P) -> io::Result<PathBuf> {
        self.save(prefix, "json", |v, w| v.write_json(w))
    }

    /// Write `<prefix>.table`
    pub fn save_as_table<P: AsRef<Path>>(&self, prefix: P) -> io::Result<PathBuf> {
        self.save(prefix, "table", |v, w| v.write_table(w))
    }

    /// Write `<prefix>.dict`
    pub fn save_as_grouped<P: AsRef<Path>>(&self, prefix: P) -> io::Result<PathBuf> {
        self.save(prefix, "dict", |v, w| v.write_grouped(w))
    }

    fn save<P, F>(&self, prefix: P, extension: &str, write: F) -> io::Result<PathBuf>
    where
        P: AsRef<Path>,
        F: FnOnce(&Self, &mut BufWriter<File>) -> io::Result<()>,
    {
        let mut path = prefix.as_ref().as_os_str().to_owned();
        path.push(".");
        path.push(extension);
        let path = PathBuf::from(path);

        info!("writing metadata as {} to {}", extension, path.display());
        let mut out = BufWriter::new(File::create(&path)?);
        write(self, &mut out)?;
        out.flush()?;
        Ok(path)
    }

    /// Render only the requested sections
    ///
    /// Keys that are not section names are looked up among the
    /// unrecognized `##key=value` lines.
    pub fn render_requested(&self, keys: &[&str]) -> String {
        let sections = self.sections();
        let mut out = Vec::new();

        for key in keys {
            if let Some((name, section)) = sections.iter().find(|(name, _)| name == key) {
                if !section.is_empty() {
                    // Writing into a Vec cannot fail
                    let _ = write_section(&mut out, name, section);
                    continue;
                }
            }

            let values: Vec<&String> = self
                .meta
                .other_lines
                .iter()
                .filter_map(|line| line.get(*key))
                .collect();
            if values.is_empty() {
                debug!("no metadata for requested key {}", key);
                continue;
            }
            out.extend_from_slice(format!("##{}\n", key).as_bytes());
            for value in values {
                out.extend_from_slice(value.as_bytes());
                out.push(b'\n');
            }
            out.push(b'\n');
        }

        String::from_utf8_lossy(&out).into_owned()
    }
}

fn write_section<W: Write>(out: &mut W, key: &str, section: &Section) -> io::Result<()> {
    writeln!(out, "##{}", key)?;
    match section {
        Section::Strings(values) => {
            writeln!(out, "{}", values.join("\t"))?;
        }
        Section::Maps(maps) if PER_ITEM_SECTIONS.contains(&key) => {
            for map in maps {
                writeln!(out, "#{}", join_keys(map))?;
                writeln!(out, "{}", join_values(map))?;
            }
        }
        Section::Maps(maps) => {
            if let Some(first) = maps.first() {
                writeln!(out, "#{}", join_keys(first))?;
            }
            for map in maps {
                writeln!(out, "{}", join_values(map))?;
            }
        }
    }
    writeln!(out)
}

fn join_keys(map: &TagMap) -> String {
    map.keys().map(String::as_str).collect::<Vec<_>>().join("\t")
}

fn join_values(map: &TagMap) -> String {
    map.values().map(String::as_str).collect::<Vec<_>>().join("\t")
}
