//! Benchmarks for MIME tree flattening and serialization.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mailflow::mime::{flatten_parts, write_message, BodyPart, MimeMessage, PartFilter, WriteOptions};

fn wide_tree(depth: usize, width: usize) -> BodyPart {
    if depth == 0 {
        return BodyPart::attachment("data.bin", "application/octet-stream", vec![7; 4096]);
    }
    let children = (0..width).map(|_| wide_tree(depth - 1, width)).collect();
    BodyPart::multipart("mixed", children)
}

fn message() -> MimeMessage {
    let mut msg = MimeMessage::default();
    msg.set_multipart(
        "mixed",
        vec![
            BodyPart::text("plain", "Hello"),
            wide_tree(3, 4),
            wide_tree(2, 6),
        ],
    );
    msg
}

fn flatten_benchmark(c: &mut Criterion) {
    let msg = message();

    c.bench_function("flatten_unfiltered", |b| {
        b.iter(|| flatten_parts(black_box(&msg), &PartFilter::new()))
    });

    let filter = PartFilter::new().with_min_size_kb(2).with_disposition("attachment");
    c.bench_function("flatten_filtered", |b| {
        b.iter(|| flatten_parts(black_box(&msg), &filter))
    });

    c.bench_function("write_message", |b| {
        b.iter(|| write_message(black_box(&msg), &WriteOptions::default()))
    });
}

criterion_group!(benches, flatten_benchmark);
criterion_main!(benches);
