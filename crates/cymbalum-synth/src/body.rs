//! Resonant body network.
//!
//! The body is a bank of up to [`MAX_UNITS`] damped string loops. Each unit:
//!
//! 1. smooths the incoming excitation with a one-pole whose time constant is
//!    `pulse_width * period`;
//! 2. adds it to a feedback delay of one period (`sample_rate / f`) whose
//!    loop gain is `10^(-3 * period / (decay * sample_rate))`, with a one-pole
//!    damping filter in the loop;
//! 3. taps the string at `pulse_position * period`;
//! 4. runs the tap through `stack` serial bandpass sections at `f`.
//!
//! With collision enabled, adjacent units whose taps differ by more than
//! `distance` exchange the excess, which is fed back into both strings on the
//! next sample. The output is the unit sum scaled by `1 / sqrt(units)`.
//!
//! # Lane Blocks
//!
//! Units are stored as structure-of-arrays blocks of `LANES` units so the
//! per-unit arithmetic runs as straight-line loops over `[f32; LANES]`.
//! Every lane performs the same scalar operations in the same order, and the
//! output sum is accumulated in unit order, so all lane widths produce the
//! same bits.

use cymbalum_core::{BiquadCoefficients, InterpolatedDelay, flush_denormal, hard_clip};
use libm::{expf, powf, sqrtf};

use crate::random::RandomState;

/// Maximum number of body units.
pub const MAX_UNITS: usize = 32;

/// Maximum bandpass sections per unit.
pub const MAX_STACK: usize = 8;

/// Lowest unit frequency after randomization, in Hz.
const MIN_UNIT_FREQUENCY: f32 = 16.0;

/// How unit frequencies are spread between the min and max frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutoffMap {
    /// Evenly spaced in Hz
    Linear,
    /// Evenly spaced in octaves
    #[default]
    Logarithmic,
    /// Integer multiples of the min frequency, capped at the max
    Harmonic,
}

impl CutoffMap {
    /// Map a parameter index to a distribution.
    pub fn from_index(index: u32) -> Self {
        match index {
            0 => Self::Linear,
            2 => Self::Harmonic,
            _ => Self::Logarithmic,
        }
    }

    /// Frequency of unit `k` of `count`.
    pub fn frequency(self, k: usize, count: usize, min: f32, max: f32) -> f32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        if count <= 1 {
            return lo;
        }
        let t = k as f32 / (count - 1) as f32;
        match self {
            Self::Linear => lo + (hi - lo) * t,
            Self::Logarithmic => lo * powf(hi / lo, t),
            Self::Harmonic => (lo * (k + 1) as f32).min(hi),
        }
    }
}

/// Body configuration, read from the parameter store once per block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySettings {
    /// Active units, 1..=32
    pub units: usize,
    /// Bandpass sections per unit, 1..=8
    pub stack: usize,
    /// Lowest unit frequency in Hz
    pub min_frequency: f32,
    /// Highest unit frequency in Hz
    pub max_frequency: f32,
    /// Collision threshold
    pub distance: f32,
    /// Loop damping pole, `[0, 1)`
    pub damping: f32,
    /// Pickup position as a fraction of the period
    pub pulse_position: f32,
    /// Excitation smoothing as a fraction of the period
    pub pulse_width: f32,
    /// T60 decay time in seconds
    pub decay: f32,
    /// Bandpass Q
    pub bandpass_q: f32,
    /// Frequency distribution
    pub cutoff_map: CutoffMap,
    /// Scale of the per-trigger offsets
    pub random_amount: f32,
}

impl Default for BodySettings {
    fn default() -> Self {
        Self {
            units: 4,
            stack: 2,
            min_frequency: 80.0,
            max_frequency: 4000.0,
            distance: 0.15,
            damping: 0.5,
            pulse_position: 0.3,
            pulse_width: 0.2,
            decay: 2.0,
            bandpass_q: 2.0,
            cutoff_map: CutoffMap::Logarithmic,
            random_amount: 0.1,
        }
    }
}

/// `LANES` biquad sections side by side.
///
/// Same Direct Form I arithmetic as [`cymbalum_core::Biquad`], lane by lane.
#[derive(Debug, Clone, Copy)]
pub struct BandpassLanes<const LANES: usize> {
    b0: [f32; LANES],
    b1: [f32; LANES],
    b2: [f32; LANES],
    a1: [f32; LANES],
    a2: [f32; LANES],
    x1: [f32; LANES],
    x2: [f32; LANES],
    y1: [f32; LANES],
    y2: [f32; LANES],
}

impl<const LANES: usize> BandpassLanes<LANES> {
    /// Passthrough sections with cleared state.
    pub fn new() -> Self {
        Self {
            b0: [1.0; LANES],
            b1: [0.0; LANES],
            b2: [0.0; LANES],
            a1: [0.0; LANES],
            a2: [0.0; LANES],
            x1: [0.0; LANES],
            x2: [0.0; LANES],
            y1: [0.0; LANES],
            y2: [0.0; LANES],
        }
    }

    /// Load coefficients into one lane.
    pub fn set_lane(&mut self, lane: usize, c: BiquadCoefficients) {
        self.b0[lane] = c.b0;
        self.b1[lane] = c.b1;
        self.b2[lane] = c.b2;
        self.a1[lane] = c.a1;
        self.a2[lane] = c.a2;
    }

    /// Filter one sample per lane, in place.
    #[inline]
    pub fn process(&mut self, x: &mut [f32; LANES]) {
        for l in 0..LANES {
            let input = x[l];
            let output = self.b0[l] * input + self.b1[l] * self.x1[l] + self.b2[l] * self.x2[l]
                - self.a1[l] * self.y1[l]
                - self.a2[l] * self.y2[l];
            self.x2[l] = self.x1[l];
            self.x1[l] = input;
            self.y2[l] = self.y1[l];
            self.y1[l] = flush_denormal(output);
            x[l] = self.y1[l];
        }
    }

    /// Clear state, keep coefficients.
    pub fn clear(&mut self) {
        self.x1 = [0.0; LANES];
        self.x2 = [0.0; LANES];
        self.y1 = [0.0; LANES];
        self.y2 = [0.0; LANES];
    }
}

impl<const LANES: usize> Default for BandpassLanes<LANES> {
    fn default() -> Self {
        Self::new()
    }
}

/// Coefficients and state of `LANES` units.
#[derive(Debug, Clone)]
struct UnitBlock<const LANES: usize> {
    active: [f32; LANES],
    /// String read delay (period - 1) in samples
    loop_delay: [f32; LANES],
    /// Pickup read delay in samples
    pickup: [f32; LANES],
    loop_gain: [f32; LANES],
    excite_coeff: [f32; LANES],
    damping: [f32; LANES],
    excite_state: [f32; LANES],
    damp_state: [f32; LANES],
    stages: [BandpassLanes<LANES>; MAX_STACK],
}

impl<const LANES: usize> UnitBlock<LANES> {
    fn new() -> Self {
        Self {
            active: [0.0; LANES],
            loop_delay: [1.0; LANES],
            pickup: [0.0; LANES],
            loop_gain: [0.0; LANES],
            excite_coeff: [0.0; LANES],
            damping: [0.0; LANES],
            excite_state: [0.0; LANES],
            damp_state: [0.0; LANES],
            stages: [BandpassLanes::new(); MAX_STACK],
        }
    }

    fn clear(&mut self) {
        self.excite_state = [0.0; LANES];
        self.damp_state = [0.0; LANES];
        for stage in &mut self.stages {
            stage.clear();
        }
    }
}

/// The resonator bank, processed in blocks of `LANES` units.
///
/// # Example
///
/// ```rust
/// use cymbalum_synth::{BodySettings, RandomState, ResonantBody};
///
/// let mut body = ResonantBody::<4>::new(48000.0);
/// body.configure(&BodySettings::default());
/// body.trigger(&mut RandomState::new(0));
///
/// let first = body.process(1.0, true);
/// assert!(first.is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct ResonantBody<const LANES: usize> {
    sample_rate: f32,
    settings: BodySettings,
    blocks: Vec<UnitBlock<LANES>>,
    strings: Vec<InterpolatedDelay>,
    frequencies: [f32; MAX_UNITS],
    /// Raw trigger offsets in `[-1, 1)` and `[0, 1)`.
    frequency_offsets: [f32; MAX_UNITS],
    gain_offsets: [f32; MAX_UNITS],
    taps: [f32; MAX_UNITS],
    outputs: [f32; MAX_UNITS],
    collision: [f32; MAX_UNITS],
    output_scale: f32,
}

impl<const LANES: usize> ResonantBody<LANES> {
    /// New body at `sample_rate` with default settings.
    pub fn new(sample_rate: f32) -> Self {
        const { assert!(LANES > 0 && MAX_UNITS % LANES == 0) };

        let mut body = Self {
            sample_rate,
            settings: BodySettings::default(),
            blocks: (0..MAX_UNITS / LANES).map(|_| UnitBlock::new()).collect(),
            strings: Vec::new(),
            frequencies: [0.0; MAX_UNITS],
            frequency_offsets: [0.0; MAX_UNITS],
            gain_offsets: [0.0; MAX_UNITS],
            taps: [0.0; MAX_UNITS],
            outputs: [0.0; MAX_UNITS],
            collision: [0.0; MAX_UNITS],
            output_scale: 1.0,
        };
        body.allocate_strings();
        body.configure(&BodySettings::default());
        body
    }

    /// Change sample rate. Reallocates the strings and clears all state.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.allocate_strings();
        self.reset();
        let settings = self.settings;
        self.configure(&settings);
    }

    fn allocate_strings(&mut self) {
        let capacity = libm::ceilf(self.sample_rate / MIN_UNIT_FREQUENCY) as usize + 4;
        self.strings = (0..MAX_UNITS)
            .map(|_| InterpolatedDelay::new(capacity))
            .collect();
    }

    /// Recompute per-unit coefficients. State is kept.
    pub fn configure(&mut self, settings: &BodySettings) {
        let mut s = *settings;
        s.units = s.units.clamp(1, MAX_UNITS);
        s.stack = s.stack.clamp(1, MAX_STACK);
        self.settings = s;
        self.output_scale = 1.0 / sqrtf(s.units as f32);

        let sr = self.sample_rate;
        let capacity = self.strings.first().map_or(0, InterpolatedDelay::capacity);
        let max_period = capacity.saturating_sub(3).max(2) as f32;
        let amount = s.random_amount.clamp(0.0, 1.0);
        let decay = s.decay.max(1e-3);
        let q = s.bandpass_q.max(0.01);

        for k in 0..MAX_UNITS {
            let block = &mut self.blocks[k / LANES];
            let l = k % LANES;

            if k >= s.units {
                block.active[l] = 0.0;
                block.loop_gain[l] = 0.0;
                self.frequencies[k] = 0.0;
                continue;
            }

            let base = s
                .cutoff_map
                .frequency(k, s.units, s.min_frequency, s.max_frequency);
            let frequency = (base * (1.0 + 0.15 * amount * self.frequency_offsets[k]))
                .min(sr * 0.45)
                .max(MIN_UNIT_FREQUENCY);
            let period = (sr / frequency).clamp(2.0, max_period);

            let width = s.pulse_width.clamp(0.0, 1.0) * period;
            let gain = powf(10.0, -3.0 * period / (decay * sr))
                * (1.0 - 0.05 * amount * self.gain_offsets[k]);

            block.active[l] = 1.0;
            block.loop_delay[l] = period - 1.0;
            block.pickup[l] = s.pulse_position.clamp(0.0, 1.0) * period;
            block.loop_gain[l] = gain;
            block.excite_coeff[l] = if width > 0.0 { expf(-1.0 / width) } else { 0.0 };
            block.damping[l] = s.damping.clamp(0.0, 0.9999);

            let coeffs = BiquadCoefficients::bandpass(frequency, q, sr);
            for stage in &mut block.stages[..s.stack] {
                stage.set_lane(l, coeffs);
            }
            self.frequencies[k] = frequency;
        }
    }

    /// Draw new per-unit offsets and apply them.
    ///
    /// Always consumes the same number of values from `random`, whatever the
    /// unit count or lane width.
    pub fn trigger(&mut self, random: &mut RandomState) {
        for k in 0..MAX_UNITS {
            self.frequency_offsets[k] = random.bipolar();
            self.gain_offsets[k] = random.unit();
        }
        let settings = self.settings;
        self.configure(&settings);
    }

    /// Clear strings, filters and collision feedback.
    pub fn reset(&mut self) {
        for string in &mut self.strings {
            string.clear();
        }
        for block in &mut self.blocks {
            block.clear();
        }
        self.taps = [0.0; MAX_UNITS];
        self.outputs = [0.0; MAX_UNITS];
        self.collision = [0.0; MAX_UNITS];
    }

    /// Current settings.
    pub fn settings(&self) -> &BodySettings {
        &self.settings
    }

    /// Frequency of each active unit after randomization.
    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies[..self.settings.units]
    }

    /// Render one output sample from one excitation sample.
    #[inline]
    pub fn process(&mut self, input: f32, collision: bool) -> f32 {
        let stack = self.settings.stack;

        for (b, block) in self.blocks.iter_mut().enumerate() {
            let base = b * LANES;
            let strings = &mut self.strings[base..base + LANES];

            let mut feedback = [0.0; LANES];
            for l in 0..LANES {
                feedback[l] = strings[l].read(block.loop_delay[l]);
            }

            let mut tap = [0.0; LANES];
            for l in 0..LANES {
                let x = input * block.active[l];
                let excite = x + block.excite_coeff[l] * (block.excite_state[l] - x);
                block.excite_state[l] = flush_denormal(excite);

                let fb = feedback[l];
                let damped = fb + block.damping[l] * (block.damp_state[l] - fb);
                block.damp_state[l] = flush_denormal(damped);

                let string =
                    excite + block.loop_gain[l] * block.damp_state[l] + self.collision[base + l];
                strings[l].write(flush_denormal(string));
                tap[l] = strings[l].read(block.pickup[l]);
            }
            self.taps[base..base + LANES].copy_from_slice(&tap);

            for stage in &mut block.stages[..stack] {
                stage.process(&mut tap);
            }
            for l in 0..LANES {
                self.outputs[base + l] = tap[l] * block.active[l];
            }
        }

        let units = self.settings.units;
        self.collision = [0.0; MAX_UNITS];
        if collision {
            let distance = self.settings.distance.max(0.0);
            for k in 0..units.saturating_sub(1) {
                let diff = self.taps[k] - self.taps[k + 1];
                let excess = hard_clip(diff - diff.clamp(-distance, distance), 1.0);
                self.collision[k] -= 0.5 * excess;
                self.collision[k + 1] += 0.5 * excess;
            }
        }

        let mut sum = 0.0;
        for &out in &self.outputs[..units] {
            sum += out;
        }
        sum * self.output_scale
    }
}
