//! Criterion benchmarks for the Vision-Dispatch codec.
//!
//! Decoding copies the whole pixel buffer once, so its cost grows with image
//! size; these benches track that cost for common camera resolutions next to
//! the (tiny) cost of encoding a result table.
//!
//! Run with:
//! ```bash
//! cargo bench --package vision-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vision_core::protocol::codec::{decode_frame, decode_result_table, encode_result_set};
use vision_core::protocol::format_shape_descriptor;
use vision_core::{ResultRow, ResultSet, ShapeDescriptor};

fn bench_decode_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");
    for (name, shape) in [
        ("224x224x3", ShapeDescriptor::new(224, 224, 3)),
        ("480x640x3", ShapeDescriptor::new(480, 640, 3)),
        ("1080x1920x3", ShapeDescriptor::new(1080, 1920, 3)),
    ] {
        let bytes = vec![0x7Fu8; shape.byte_len().unwrap_or(0)];
        let descriptor = format_shape_descriptor(&shape);
        group.bench_with_input(BenchmarkId::from_parameter(name), &bytes, |b, bytes| {
            b.iter(|| decode_frame(black_box(bytes), black_box(descriptor.as_bytes())))
        });
    }
    group.finish();
}

fn bench_result_table(c: &mut Criterion) {
    let set: ResultSet = (0..5).map(|i| ResultRow::new(i, 0.2)).collect();
    let encoded = encode_result_set(&set);

    c.bench_function("encode_result_set_top5", |b| {
        b.iter(|| encode_result_set(black_box(&set)))
    });
    c.bench_function("decode_result_table_top5", |b| {
        b.iter(|| decode_result_table(black_box(&encoded)))
    });
}

criterion_group!(benches, bench_decode_frame, bench_result_table);
criterion_main!(benches);
