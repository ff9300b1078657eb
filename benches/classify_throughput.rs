use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use csv_probe::classify::{ScanOptions, classify_field, classify_line};
use csv_probe::flags::DetectFlags;
use csv_probe::schema::infer_from_lines;

fn generate_lines(rows: usize) -> Vec<String> {
    (0..rows)
        .map(|i| {
            let flag = if i % 2 == 0 { "true" } else { "no" };
            let amount = i as f64 / 8.0;
            format!("{i},0x{i:X},{amount:.3},{flag},batch-{}", i % 97)
        })
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let opts = ScanOptions::default();
    let flags = DetectFlags::default();
    let lines = generate_lines(10_000);

    let mut group = c.benchmark_group("classify");

    group.bench_function("classify_field", |b| {
        b.iter(|| {
            for span in ["1024", "0xBEEF", "-3.5e2", "true", "mixed bag"] {
                black_box(classify_field(span, flags));
            }
        });
    });

    group.bench_function("classify_line", |b| {
        b.iter(|| {
            for line in &lines {
                black_box(classify_line(line, &opts, flags));
            }
        });
    });

    group.bench_function("infer_from_lines_10k", |b| {
        b.iter_batched(
            || {
                lines
                    .iter()
                    .map(|line| Ok(line.clone()))
                    .collect::<Vec<std::io::Result<String>>>()
            },
            |batch| infer_from_lines(batch, &opts, flags, 0).expect("infer"),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
