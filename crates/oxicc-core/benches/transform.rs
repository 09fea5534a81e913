//! Transform benchmarks
//!
//! Covers the hot paths: container decode, curve evaluation, and the two
//! CLUT interpolators behind LUT application.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use oxicc_core::math::interpolation::{multilinear_interp, tetrahedral_interp_3d};
use oxicc_core::{
    ColorSpace, Curve, Direction, Profile, ProfileClass, RenderingIntent, TagSignature, Transform,
    Version,
};

// sRGB primaries in XYZ (D50), Bradford-adapted
const RED_D50: [f64; 3] = [0.4361, 0.2225, 0.0139];
const GREEN_D50: [f64; 3] = [0.3851, 0.7169, 0.0971];
const BLUE_D50: [f64; 3] = [0.1431, 0.0606, 0.7141];

fn srgb_profile_bytes() -> Vec<u8> {
    use oxicc_core::icc::tags::xyz::encode_xyz;

    let mut p = Profile {
        version: Version::V4_4_0,
        class: ProfileClass::DISPLAY_DEVICE,
        color_space: ColorSpace::RGB,
        pcs: ColorSpace::PCS_XYZ,
        ..Profile::default()
    };
    p.tag_data
        .insert(TagSignature::RED_MATRIX_COLUMN, encode_xyz(RED_D50));
    p.tag_data
        .insert(TagSignature::GREEN_MATRIX_COLUMN, encode_xyz(GREEN_D50));
    p.tag_data
        .insert(TagSignature::BLUE_MATRIX_COLUMN, encode_xyz(BLUE_D50));
    let trc = Curve::parametric(
        3,
        vec![2.4, 1.0 / 1.055, 0.055 / 1.055, 1.0 / 12.92, 0.04045],
    )
    .encode();
    p.tag_data.insert(TagSignature::RED_TRC, trc.clone());
    p.tag_data.insert(TagSignature::GREEN_TRC, trc.clone());
    p.tag_data.insert(TagSignature::BLUE_TRC, trc);
    p.encode().unwrap()
}

fn generate_rgb_data(count: usize) -> Vec<[f64; 3]> {
    (0..count)
        .map(|i| {
            let t = i as f64 / count as f64;
            [t, (t * 2.0) % 1.0, (t * 3.0) % 1.0]
        })
        .collect()
}

fn identity_clut(grid: usize) -> Vec<f64> {
    let mut clut = vec![0.0; grid * grid * grid * 3];
    for r in 0..grid {
        for g in 0..grid {
            for b in 0..grid {
                let idx = ((r * grid + g) * grid + b) * 3;
                clut[idx] = r as f64 / (grid - 1) as f64;
                clut[idx + 1] = g as f64 / (grid - 1) as f64;
                clut[idx + 2] = b as f64 / (grid - 1) as f64;
            }
        }
    }
    clut
}

fn bench_profile_decode(c: &mut Criterion) {
    let data = srgb_profile_bytes();
    c.bench_function("profile_decode", |b| {
        b.iter(|| Profile::decode(black_box(data.clone())).unwrap())
    });
}

fn bench_transform_apply(c: &mut Criterion) {
    let profile = Profile::decode(srgb_profile_bytes()).unwrap();
    let transform = Transform::new(
        &profile,
        Direction::DeviceToPcs,
        RenderingIntent::PERCEPTUAL,
    )
    .unwrap();
    let pixels = generate_rgb_data(1024);

    let mut group = c.benchmark_group("transform_apply");
    group.throughput(Throughput::Elements(pixels.len() as u64));
    group.bench_function("matrix_trc_device_to_pcs", |b| {
        b.iter(|| {
            for rgb in &pixels {
                black_box(transform.to_xyz(black_box(rgb)));
            }
        })
    });
    group.finish();
}

fn bench_interpolators(c: &mut Criterion) {
    let grid = 17;
    let clut = identity_clut(grid);
    let dims = [grid, grid, grid];
    let pixels = generate_rgb_data(1024);

    let mut group = c.benchmark_group("clut_interp");
    group.throughput(Throughput::Elements(pixels.len() as u64));
    group.bench_function("tetrahedral", |b| {
        b.iter(|| {
            for rgb in &pixels {
                black_box(tetrahedral_interp_3d(
                    black_box(&clut),
                    grid,
                    3,
                    rgb[0],
                    rgb[1],
                    rgb[2],
                ));
            }
        })
    });
    group.bench_function("multilinear", |b| {
        b.iter(|| {
            for rgb in &pixels {
                black_box(multilinear_interp(black_box(&clut), &dims, 3, rgb));
            }
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_profile_decode,
    bench_transform_apply,
    bench_interpolators
);
criterion_main!(benches);
