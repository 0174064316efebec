//! Performance benchmarks for FastVcfParser
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fast_vcfparser::formats::{parse_header_lines, FIXED_COLUMNS};
use fast_vcfparser::{split_to_dict, to_iupac, Bases, Record, VcfParser};
use std::fmt::Write;

const INFO_LINE: &str =
    r#"<ID=AF,Number=A,Type=Float,Description="Allele Frequency, for each ALT allele, in the same order as listed">"#;

/// Column header keys for `n` samples
fn record_keys(n: usize) -> Vec<String> {
    FIXED_COLUMNS
        .iter()
        .map(|s| s.to_string())
        .chain((0..n).map(|i| format!("S{}", i)))
        .collect()
}

/// A data line with `n` samples cycling through the genotype classes
fn data_line(pos: u64, n: usize) -> String {
    const CALLS: [&str; 5] = ["0/0:12", "0/1:9", "1/1:7", "./.:.", "1|2:15"];
    let mut line = format!("chr1\t{}\t.\tG\tA,T\t50\tPASS\tDP=100;AF=0.5,0.1\tGT:DP", pos);
    for i in 0..n {
        line.push('\t');
        line.push_str(CALLS[i % CALLS.len()]);
    }
    line
}

/// A complete in-memory VCF
fn synthetic_vcf(records: usize, samples: usize) -> String {
    let mut text = String::from("##fileformat=VCFv4.2\n");
    let _ = writeln!(text, "##INFO={}", INFO_LINE);
    text.push_str("##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n");
    text.push_str("##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Read Depth\">\n");
    let _ = writeln!(text, "#{}", record_keys(samples).join("\t"));
    for i in 0..records {
        let _ = writeln!(text, "{}", data_line(1000 + i as u64 * 10, samples));
    }
    text
}

/// Benchmark tag-list splitting
fn bench_split_to_dict(c: &mut Criterion) {
    c.bench_function("split_to_dict", |b| {
        b.iter(|| {
            let tags = split_to_dict(black_box(INFO_LINE)).unwrap();
            black_box(tags)
        })
    });
}

/// Benchmark header parsing
fn bench_header(c: &mut Criterion) {
    let text = synthetic_vcf(0, 100);

    c.bench_function("parse_header_100_samples", |b| {
        b.iter(|| {
            let meta = parse_header_lines(black_box(text.as_str()).lines()).unwrap();
            black_box(meta)
        })
    });
}

/// Benchmark record decoding and lazy sample mapping
fn bench_record_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_decode");

    for samples in [1usize, 10, 100, 1000] {
        let keys = record_keys(samples);
        let line = data_line(12345, samples);
        group.throughput(Throughput::Bytes(line.len() as u64));

        group.bench_with_input(BenchmarkId::new("decode", samples), &line, |b, line| {
            b.iter(|| black_box(Record::decode(black_box(line), &keys).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("decode_and_map", samples), &line, |b, line| {
            b.iter(|| {
                let record = Record::decode(black_box(line), &keys).unwrap();
                black_box(record.mapped_format_to_sample().len())
            })
        });
    }

    group.finish();
}

/// Benchmark single-pass genotype classification
fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    for samples in [10usize, 100, 1000] {
        let keys = record_keys(samples);
        let record = Record::decode(&data_line(12345, samples), &keys).unwrap();
        group.throughput(Throughput::Elements(samples as u64));

        for bases in [Bases::Numeric, Bases::Iupac] {
            group.bench_with_input(
                BenchmarkId::new(bases.to_string(), samples),
                &record,
                |b, record| {
                    b.iter(|| {
                        let classes = record.genotype_property().classify("GT", bases).unwrap();
                        black_box(classes)
                    })
                },
            );
        }
    }

    group.finish();
}

/// Benchmark numeric -> base conversion
fn bench_to_iupac(c: &mut Criterion) {
    let ref_alt = ["G", "A", "T"];

    c.bench_function("to_iupac", |b| {
        b.iter(|| {
            let bases = to_iupac(&ref_alt, black_box("1|2"), Bases::Iupac).unwrap();
            black_box(bases)
        })
    });
}

/// Benchmark streaming a whole file from memory
fn bench_stream(c: &mut Criterion) {
    let text = synthetic_vcf(1_000, 50);
    let mut group = c.benchmark_group("stream");
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("records_1000x50", |b| {
        b.iter(|| {
            let records = VcfParser::from_bytes(black_box(text.as_bytes()))
                .parse_records()
                .unwrap();
            black_box(records.filter(|r| r.is_ok()).count())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_split_to_dict,
    bench_header,
    bench_record_decode,
    bench_classify,
    bench_to_iupac,
    bench_stream,
);

criterion_main!(benches);
