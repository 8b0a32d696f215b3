use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use static_mask::mask::{MaskConfig, StaticMask};
use static_mask::video::{FrameGeometry, FrameSource, PixelFormat, SyntheticSource};

fn bench_process(c: &mut Criterion) {
    let geometry = FrameGeometry::new(1280, 720, PixelFormat::Yuv420p);
    let mut group = c.benchmark_group("process_720p");

    for block_size in [8u32, 20, 64] {
        let mut source = SyntheticSource::new(geometry, 2, 32).unwrap();
        let frames = [
            source.next_frame().unwrap().unwrap(),
            source.next_frame().unwrap().unwrap(),
        ];

        let mut mask = StaticMask::new(MaskConfig::new(block_size, 20.0, 2)).unwrap();
        mask.setup(geometry).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(block_size),
            &frames,
            |b, frames| {
                let mut n = 0;
                b.iter(|| {
                    let mut frame = frames[n % 2].clone();
                    n += 1;
                    black_box(mask.process(&mut frame).unwrap())
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_process);
criterion_main!(benches);
