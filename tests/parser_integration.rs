//! VCF Parser Integration Test Suite
//!
//! End-to-end tests over real files on disk: plain and gzip input, header
//! and record streaming, scan filters, metadata export and writing back.

use fast_vcfparser::core::IoStrategy;
use fast_vcfparser::{
    Bases, MetadataError, MetadataViewer, RecordFilter, VcfParser, VcfParserError, VcfWriter,
};
use flate2::write::GzEncoder;
use flate2::Compression;
use proptest::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FIXTURE: &str = "##fileformat=VCFv4.2
##reference=hg19.fa
##contig=<ID=chr1,length=249250621>
##contig=<ID=chr2,length=243199373>
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Total Depth\">
##INFO=<ID=DB,Number=0,Type=Flag,Description=\"dbSNP membership\">
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Read Depth\">
##source=unit-test
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2\tS3
chr1\t1000\trs1\tG\tA\t50\tPASS\tDP=30;DB\tGT:DP\t0/0:10\t0/1:12\t1/1:8
chr1\t2000\t.\tT\tTA,C\t40\tPASS\tDP=25\tGT:DP\t0|1:9\t./.:.\t2/2:7
chr2\t1500\t.\tG\tA,T\t.\tLowQual\t.\tGT:DP\t1/2:5\t0/0\t.:.
";

/// Write the fixture to `<dir>/<name>`, gzip-compressed when `gzip` is set
fn write_fixture(dir: &TempDir, name: &str, gzip: bool) -> PathBuf {
    let path = dir.path().join(name);
    let file = File::create(&path).unwrap();
    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(FIXTURE.as_bytes()).unwrap();
        encoder.finish().unwrap();
    } else {
        let mut file = file;
        file.write_all(FIXTURE.as_bytes()).unwrap();
    }
    path
}

/// `(chrom, pos)` of every record passing `filter`
fn positions(path: &Path, filter: RecordFilter) -> Vec<(String, u64)> {
    VcfParser::from_path(path)
        .unwrap()
        .parse_records_filtered(filter)
        .unwrap()
        .map(|r| {
            let r = r.unwrap();
            (r.chrom, r.pos)
        })
        .collect()
}

// ============================================================================
// Input handling
// ============================================================================

#[test]
fn test_plain_and_gzip_agree() {
    let dir = tempfile::tempdir().unwrap();
    let plain = write_fixture(&dir, "calls.vcf", false);
    let gzip = write_fixture(&dir, "calls.vcf.gz", true);

    let mut a = VcfParser::from_path(&plain).unwrap();
    let mut b = VcfParser::from_path(&gzip).unwrap();
    let meta_a = a.parse_metadata().unwrap().clone();
    let meta_b = b.parse_metadata().unwrap().clone();
    assert_eq!(meta_a.raw_meta_data, meta_b.raw_meta_data);
    assert_eq!(meta_a.sample_names, vec!["S1", "S2", "S3"]);

    let raw_a: Vec<String> = a.parse_records().unwrap().map(|r| r.unwrap().raw().to_string()).collect();
    let raw_b: Vec<String> = b.parse_records().unwrap().map(|r| r.unwrap().raw().to_string()).collect();
    assert_eq!(raw_a.len(), 3);
    assert_eq!(raw_a, raw_b);
}

#[test]
fn test_gzip_detected_without_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "calls.bin", true);
    assert_eq!(positions(&path, RecordFilter::new()).len(), 3);
}

#[test]
fn test_memory_mapped_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "calls.vcf", false);
    let parser = VcfParser::from_path_with_strategy(&path, IoStrategy::MemoryMapped).unwrap();
    let records: Vec<_> = parser.parse_records().unwrap().collect();
    assert_eq!(records.len(), 3);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = VcfParser::from_path(dir.path().join("absent.vcf")).err().unwrap();
    assert!(matches!(err, VcfParserError::FileNotFound(_)));
}

#[test]
fn test_records_without_column_header() {
    let data = b"##fileformat=VCFv4.2\nchr1\t1\t.\tA\tG\t.\t.\t.\tGT\t0/1\n";
    let err = VcfParser::from_bytes(data).parse_records().err().unwrap();
    assert!(matches!(err, VcfParserError::Metadata(MetadataError::MissingHeaderLine)));
}

#[test]
fn test_metadata_then_records_on_one_parser() {
    let mut parser = VcfParser::from_bytes(FIXTURE.as_bytes());
    assert_eq!(parser.parse_metadata().unwrap().file_format, "VCFv4.2");
    // Cached on the second call
    assert_eq!(parser.parse_metadata().unwrap().contig_defs.len(), 2);

    let records = parser.parse_records().unwrap();
    assert_eq!(records.sample_names(), ["S1", "S2", "S3"]);
    assert_eq!(records.count(), 3);
}

// ============================================================================
// Scan filters
// ============================================================================

#[test]
fn test_filter_by_chrom_and_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "calls.vcf", false);

    assert_eq!(
        positions(&path, RecordFilter::new().with_chrom("chr1").with_range(1500, 2500)),
        vec![("chr1".to_string(), 2000)]
    );
    assert_eq!(
        positions(&path, RecordFilter::new().with_chrom("chr2")),
        vec![("chr2".to_string(), 1500)]
    );
    // Range alone applies across chromosomes, bounds inclusive
    assert_eq!(
        positions(&path, RecordFilter::new().with_range(1000, 1500)),
        vec![("chr1".to_string(), 1000), ("chr2".to_string(), 1500)]
    );
    assert!(positions(&path, RecordFilter::new().with_chrom("chrX")).is_empty());
}

#[test]
fn test_scan_stats() {
    let parser = VcfParser::from_bytes(FIXTURE.as_bytes());
    let mut records = parser
        .parse_records_filtered(RecordFilter::new().with_chrom("chr1"))
        .unwrap();
    let emitted = records.by_ref().filter(|r| r.is_ok()).count();
    let stats = records.stats();

    assert_eq!(emitted, 2);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.emitted, 2);
    assert_eq!(stats.skipped, 1);
}

// ============================================================================
// Record queries
// ============================================================================

#[test]
fn test_record_queries() {
    let records: Vec<_> = VcfParser::from_bytes(FIXTURE.as_bytes())
        .parse_records()
        .unwrap()
        .map(Result::unwrap)
        .collect();

    let first = &records[0];
    let info = first.get_info_as_dict(&[]);
    assert_eq!(info["DP"], "30");
    assert_eq!(info["DB"], ".");
    assert!(first.has_snp());
    assert!(!first.has_indel());
    let classes = first.genotype_property().classify("GT", Bases::Iupac).unwrap();
    assert_eq!(classes.hom_ref["S1"], "G/G");
    assert_eq!(classes.het_var["S2"], "G/A");
    assert_eq!(classes.hom_var["S3"], "A/A");

    let second = &records[1];
    assert!(second.has_snp());
    assert!(second.has_indel());
    let gp = second.genotype_property();
    assert_eq!(gp.has_phased("GT", Bases::Iupac).unwrap()["S1"], "T|TA");
    assert_eq!(gp.is_missing("GT").unwrap()["S2"], "./.");
    assert_eq!(gp.is_homvar("GT", Bases::Iupac).unwrap()["S3"], "C/C");

    // S2 has GT only, padded for DP
    let third = &records[2];
    assert!(third.get_info_as_dict(&[]).is_empty());
    assert_eq!(third.tag_value("S2", "DP").unwrap(), ".");
    let long = third.map_records_long(&["GT"]).unwrap();
    assert_eq!(long.fields["FILTER"], "LowQual");
    assert_eq!(long.samples["S1"]["GT_iupac"], "A/T");
    assert_eq!(long.samples["S3"]["GT_iupac"], ".");
}

// ============================================================================
// Export and write-back
// ============================================================================

#[test]
fn test_metadata_export_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "calls.vcf.gz", true);
    let mut parser = VcfParser::from_path(&path).unwrap();
    let meta = parser.parse_metadata().unwrap();
    let viewer = MetadataViewer::new(meta);

    let json_path = viewer.save_as_json(dir.path().join("calls")).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
    assert_eq!(json["INFO"][1]["ID"], "DB");
    assert_eq!(json["samples"][2]["position"], "12");

    let table = std::fs::read_to_string(viewer.save_as_table(dir.path().join("calls")).unwrap()).unwrap();
    assert!(table.contains("##contig\n#ID\tlength\nchr1\t249250621\nchr2\t243199373\n"));
}

#[test]
fn test_copy_through_writer() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("copy.vcf");

    let mut parser = VcfParser::from_bytes(FIXTURE.as_bytes());
    let meta = parser.parse_metadata().unwrap().clone();
    let mut writer = VcfWriter::create(&out_path).unwrap();
    writer.add_metadata(&meta).unwrap();
    for record in parser.parse_records().unwrap() {
        writer.add_record(&record.unwrap()).unwrap();
    }
    writer.flush().unwrap();
    drop(writer);

    assert_eq!(std::fs::read_to_string(&out_path).unwrap(), FIXTURE);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: the filtered stream is exactly the matching subset
    #[test]
    fn test_range_filter_subset(start in 0u64..2500, len in 0u64..2000) {
        let end = start + len;
        let all: Vec<(String, u64)> = VcfParser::from_bytes(FIXTURE.as_bytes())
            .parse_records()
            .unwrap()
            .map(|r| { let r = r.unwrap(); (r.chrom, r.pos) })
            .collect();
        let filtered: Vec<(String, u64)> = VcfParser::from_bytes(FIXTURE.as_bytes())
            .parse_records_filtered(RecordFilter::new().with_range(start, end))
            .unwrap()
            .map(|r| { let r = r.unwrap(); (r.chrom, r.pos) })
            .collect();

        let expected: Vec<(String, u64)> = all
            .into_iter()
            .filter(|(_, pos)| start <= *pos && *pos <= end)
            .collect();
        prop_assert_eq!(filtered, expected);
    }
}
