// Criterion benchmarks for canvas painting and size-targeted generation

use criterion::{Criterion, criterion_group, criterion_main};
use photoset::paint;
use photoset::{GenerationRequest, Generator, ImageFormat};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_paint(c: &mut Criterion) {
    c.bench_function("paint_blocks_and_ellipses_512", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(42);
            paint::blocks_and_ellipses(512, 512, &mut rng)
        })
    });
}

fn bench_generate_jpeg(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let generator = Generator::new().with_base_dimensions(256, 256, 256);
    let request = GenerationRequest {
        target_size_bytes: 60_000,
        format: ImageFormat::Jpeg,
        output_path: dir.path().join("bench.jpg"),
    };

    c.bench_function("generate_jpeg_60k", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(42);
            generator.generate(&request, &mut rng).unwrap()
        })
    });
}

criterion_group!(benches, bench_paint, bench_generate_jpeg);
criterion_main!(benches);
