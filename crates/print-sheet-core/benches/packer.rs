use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};
use print_sheet_core::prelude::*;
use std::hint::black_box;

fn generate_requests(count: usize, min_size: u32, max_size: u32) -> Vec<LayoutRequest> {
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    (0..count)
        .map(|_| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            LayoutRequest::new(w, h, rng.gen_range(1..=4))
        })
        .collect()
}

fn bench_plan_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_layout");
    let cfg = LayoutConfig::default();

    for count in [10, 50, 200] {
        let requests = generate_requests(count, 100, 700);
        let copies: u64 = requests.iter().map(|r| r.copies as u64).sum();
        group.throughput(Throughput::Elements(copies));
        group.bench_with_input(BenchmarkId::from_parameter(count), &requests, |b, reqs| {
            b.iter(|| black_box(plan_layout(reqs, &cfg)))
        });
    }
    group.finish();
}

fn bench_guillotine_raw(c: &mut Criterion) {
    let mut group = c.benchmark_group("guillotine");
    for count in [100, 1000] {
        let sizes: Vec<(u32, u32)> = generate_requests(count, 8, 64)
            .iter()
            .map(|r| (r.width, r.height))
            .collect();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &sizes, |b, sizes| {
            b.iter(|| {
                let mut packer = GuillotinePacker::new(1024, 1024);
                black_box(packer.pack(sizes))
            })
        });
    }
    group.finish();
}

fn bench_build_page(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_page");
    group.sample_size(10);
    let photo = DynamicImage::ImageRgb8(RgbImage::from_fn(640, 480, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }));
    let requests = vec![
        PlacementRequest::new(PrintItem::new(photo.clone(), 600, 600), 4),
        PlacementRequest::new(PrintItem::new(photo.clone(), 450, 450), 4),
        PlacementRequest::new(PrintItem::new(photo, 300, 300), 4),
    ];
    let builder = SheetBuilder::new(LayoutConfig::default());
    group.bench_function("a4_id_package", |b| {
        b.iter(|| black_box(builder.build_page(&requests)))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_plan_layout,
    bench_guillotine_raw,
    bench_build_page
);
criterion_main!(benches);
