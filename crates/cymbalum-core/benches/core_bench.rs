//! Criterion benchmarks for cymbalum-core DSP primitives
//!
//! Run with: cargo bench -p cymbalum-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use cymbalum_core::{
    Biquad, BiquadCoefficients, InterpolatedDelay, LinearSmoother, OnePole, midi_to_frequency,
};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn generate_test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_biquad(c: &mut Criterion) {
    let mut group = c.benchmark_group("Biquad");
    let coeffs = BiquadCoefficients::bandpass(1000.0, 2.0, SAMPLE_RATE);

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);
        group.bench_with_input(
            BenchmarkId::new("bandpass", block_size),
            &block_size,
            |b, _| {
                let mut biquad = Biquad::new();
                biquad.set_normalized(coeffs);
                b.iter(|| {
                    for &sample in &input {
                        black_box(biquad.process(black_box(sample)));
                    }
                });
            },
        );
    }

    group.bench_function("coefficient_calc", |b| {
        b.iter(|| {
            black_box(BiquadCoefficients::bandpass(
                black_box(1000.0),
                black_box(2.0),
                black_box(SAMPLE_RATE),
            ))
        });
    });

    group.finish();
}

fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("InterpolatedDelay");

    for &block_size in BLOCK_SIZES {
        let input = generate_test_signal(block_size);
        group.bench_with_input(
            BenchmarkId::new("read_write", block_size),
            &block_size,
            |b, _| {
                let mut delay = InterpolatedDelay::from_time(SAMPLE_RATE, 0.1);
                b.iter(|| {
                    for &sample in &input {
                        let out = delay.read(black_box(95.3));
                        delay.write(sample + out * 0.3);
                        black_box(out);
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_misc(c: &mut Criterion) {
    let mut group = c.benchmark_group("Misc");

    group.bench_function("smoother_1024", |b| {
        let mut s = LinearSmoother::with_config(0.0, SAMPLE_RATE, 0.02);
        b.iter(|| {
            s.push(black_box(1.0));
            for _ in 0..1024 {
                black_box(s.process());
            }
            s.reset(0.0);
        });
    });

    group.bench_function("one_pole_1024", |b| {
        let mut lp = OnePole::new(SAMPLE_RATE, 2000.0);
        let input = generate_test_signal(1024);
        b.iter(|| {
            for &x in &input {
                black_box(lp.process(x));
            }
        });
    });

    group.bench_function("midi_to_frequency", |b| {
        b.iter(|| black_box(midi_to_frequency(black_box(60), black_box(12.5))));
    });

    group.finish();
}

criterion_group!(benches, bench_biquad, bench_delay, bench_misc);
criterion_main!(benches);
