//! Benchmarks for decoding and encoding simfiles.

use std::fmt::Write as _;
use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use simfile_exchange::{Decoder, Encoder, SmDecoder, SmEncoder, SscDecoder, SscEncoder};

/// Build a synthetic `.sm` file with dense 16th-note measures and a
/// handful of tempo changes.
fn synthetic_sm(measures: usize) -> String {
    let mut out = String::from(
        "#TITLE:Bench;\n#ARTIST:Generator;\n#OFFSET:-0.120;\n#BPMS:0.000=174.000,64.000=87.000,128.000=174.000;\n#STOPS:32.000=0.500;\n",
    );
    out.push_str("#NOTES:dance-single:generated:Challenge:12:0,0,0,0,0:\n");
    for measure in 0..measures {
        if measure > 0 {
            out.push_str(",\n");
        }
        for line in 0..16 {
            let lane = (measure + line) % 4;
            for cell in 0..4 {
                out.push(if cell == lane { '1' } else { '0' });
            }
            out.push('\n');
        }
    }
    out.push_str(";\n");
    out
}

fn synthetic_ssc(measures: usize) -> String {
    let mut out = String::from(
        "#VERSION:0.83;\n#TITLE:Bench;\n#OFFSET:-0.120;\n#BPMS:0.000=174.000;\n#WARPS:16.000=4.000;\n#SCROLLS:0.000=1.000,32.000=0.500;\n",
    );
    out.push_str("#NOTEDATA:;\n#STEPSTYPE:dance-single;\n#DIFFICULTY:Challenge;\n#METER:12;\n#NOTES:\n");
    for measure in 0..measures {
        if measure > 0 {
            out.push_str(",\n");
        }
        for line in 0..16 {
            let lane = (measure + line) % 4;
            let _ = writeln!(
                out,
                "{}",
                (0..4).map(|c| if c == lane { '1' } else { '0' }).collect::<String>()
            );
        }
    }
    out.push_str(";\n");
    out
}

fn bench_sm(c: &mut Criterion) {
    let data = synthetic_sm(256).into_bytes();
    let song = SmDecoder::decode(&data).unwrap();

    let mut group = c.benchmark_group("Sm");
    group.bench_function("decode_256_measures", |b| {
        b.iter(|| SmDecoder::decode(black_box(&data)));
    });
    group.bench_function("encode_256_measures", |b| {
        b.iter(|| SmEncoder::encode(black_box(&song)));
    });
    group.finish();
}

fn bench_ssc(c: &mut Criterion) {
    let data = synthetic_ssc(256).into_bytes();
    let song = SscDecoder::decode(&data).unwrap();

    let mut group = c.benchmark_group("Ssc");
    group.bench_function("decode_256_measures", |b| {
        b.iter(|| SscDecoder::decode(black_box(&data)));
    });
    group.bench_function("encode_256_measures", |b| {
        b.iter(|| SscEncoder::encode(black_box(&song)));
    });
    group.finish();
}

criterion_group!(benches, bench_sm, bench_ssc);
criterion_main!(benches);
