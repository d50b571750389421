use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};
use kz_core::StereoPair;
use kz_stereo::{Matcher, Parameters};

/// Textured scene with a foreground band shifted by 3 pixels.
fn synthetic_pair(width: u32, height: u32) -> (GrayImage, GrayImage) {
    let texture = |x: u32, y: u32| ((x * 37 + y * 91) % 200) as u8;
    let band = |x: i32, y: u32| (8..24).contains(&x) && y >= height / 3 && y < 2 * height / 3;
    let left = GrayImage::from_fn(width, height, |x, y| {
        Luma([if band(x as i32, y) { 230 } else { texture(x, y) }])
    });
    let right = GrayImage::from_fn(width, height, |x, y| {
        Luma([if band(x as i32 - 3, y) { 230 } else { texture(x, y) }])
    });
    (left, right)
}

fn bench_expansion(c: &mut Criterion) {
    let (left, right) = synthetic_pair(48, 48);

    c.bench_function("expansion_48x48_d0_4", |b| {
        b.iter(|| {
            let pair = StereoPair::from_gray(&left, &right).unwrap();
            let mut m = Matcher::new(pair, 0, 4).unwrap();
            let mut params = Parameters::default();
            params.k = 300;
            params.lambda1 = 9;
            params.lambda2 = 3;
            params.seed = Some(1);
            m.set_parameters(params).unwrap();
            black_box(m.run().unwrap())
        })
    });
}

criterion_group!(benches, bench_expansion);
criterion_main!(benches);
