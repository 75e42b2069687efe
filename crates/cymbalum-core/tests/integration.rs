//! Integration tests for cymbalum-core DSP primitives.
//!
//! Verifies signal-level behavior: bandpass selectivity, serial bandpass
//! stacking, and smoothed gain applied across blocks.

use cymbalum_core::{
    Biquad, BiquadCoefficients, Effect, LinearSmoother, OnePole, midi_to_frequency,
};

const SAMPLE_RATE: f32 = 48000.0;
const TAU: f32 = core::f32::consts::TAU;

fn generate_sine(freq_hz: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|n| libm::sinf(TAU * freq_hz * n as f32 / SAMPLE_RATE))
        .collect()
}

fn rms(signal: &[f32]) -> f32 {
    let sum_sq: f32 = signal.iter().map(|&s| s * s).sum();
    libm::sqrtf(sum_sq / signal.len() as f32)
}

fn stack_response(depth: usize, center: f32, probe: f32) -> f32 {
    let mut stages: Vec<Biquad> = (0..depth)
        .map(|_| {
            let mut b = Biquad::new();
            b.set_normalized(BiquadCoefficients::bandpass(center, 2.0, SAMPLE_RATE));
            b
        })
        .collect();
    let input = generate_sine(probe, 9600);
    let output: Vec<f32> = input
        .iter()
        .map(|&x| stages.iter_mut().fold(x, |acc, s| s.process(acc)))
        .collect();
    rms(&output[4800..]) / rms(&input[4800..])
}

#[test]
fn bandpass_stack_narrows_with_depth() {
    let center = midi_to_frequency(69, 0.0);
    let off = center * 4.0;

    let shallow = stack_response(1, center, off);
    let deep = stack_response(4, center, off);
    assert!(
        deep < shallow * 0.5,
        "Deeper stack should reject off-center more, {deep} vs {shallow}"
    );

    let at_center = stack_response(4, center, center);
    assert!(
        (at_center - 1.0).abs() < 0.05,
        "Stack should stay near unity at center, got {at_center}"
    );
}

#[test]
fn smoothed_gain_across_blocks_is_continuous() {
    let mut gain = LinearSmoother::with_config(0.0, SAMPLE_RATE, 0.005);
    let mut prev = 0.0;
    for block in 0..8 {
        gain.push(if block % 2 == 0 { 1.0 } else { 0.25 });
        for _ in 0..64 {
            let g = gain.process();
            assert!(
                (g - prev).abs() <= 1.0 / 240.0 + 1e-6,
                "Gain jumped from {prev} to {g}"
            );
            prev = g;
        }
    }
}

#[test]
fn one_pole_as_effect_block() {
    struct Lp(OnePole);
    impl Effect for Lp {
        fn process(&mut self, input: f32) -> f32 {
            self.0.process(input)
        }
        fn set_sample_rate(&mut self, _: f32) {}
        fn reset(&mut self) {
            self.0.reset();
        }
    }

    let mut lp = Lp(OnePole::with_coefficient(0.5));
    let out: Vec<f32> = (0..4).map(|_| lp.process(1.0)).collect();
    assert_eq!(out, [0.5, 0.75, 0.875, 0.9375]);
}
