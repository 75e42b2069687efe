//! Excitation oscillators.
//!
//! The oscillator bank generates the signal that strikes the resonant body.
//! One [`OscillatorMode`] is active per block:
//!
//! | Mode | Output |
//! |------|--------|
//! | `Off` | nothing; the external input passes alone |
//! | `Impulse` | one unit pulse per note-on |
//! | `Sustain` | pulse train at the held note's frequency |
//! | `SparseNoise` | velvet noise, one random impulse per period |
//! | `RandomWalk` | leaky random walk folded into `[-1, 1]` |
//!
//! The noise generators own their own [`fastrand::Rng`]; they are reseeded
//! from the engine's [`RandomState`] only when a note triggers them.

use crate::random::RandomState;

/// Oscillator mode, from the `osc_type` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OscillatorMode {
    /// External input only
    Off,
    /// Single pulse per trigger
    #[default]
    Impulse,
    /// Periodic pulses at note frequency
    Sustain,
    /// Velvet noise at note frequency density
    SparseNoise,
    /// Brownian walk with pitch-dependent drift
    RandomWalk,
}

impl OscillatorMode {
    /// Map a parameter index to a mode. Out-of-range values select
    /// `Impulse`.
    pub fn from_index(index: u32) -> Self {
        match index {
            0 => Self::Off,
            2 => Self::Sustain,
            3 => Self::SparseNoise,
            4 => Self::RandomWalk,
            _ => Self::Impulse,
        }
    }

    /// Whether the mode follows the held note's pitch.
    pub fn uses_pitch(self) -> bool {
        matches!(self, Self::Sustain | Self::SparseNoise | Self::RandomWalk)
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Impulse => "impulse",
            Self::Sustain => "sustain",
            Self::SparseNoise => "sparse-noise",
            Self::RandomWalk => "random-walk",
        }
    }
}

/// Phase-accumulating pulse generator.
///
/// Emits `1.0` on the sample where the phase wraps past one. Setting the
/// phase to one makes the next sample a pulse regardless of frequency.
#[derive(Debug, Clone, Default)]
pub struct PulseOscillator {
    phase: f32,
    frequency: f32,
}

impl PulseOscillator {
    /// Set the pulse rate in Hz.
    pub fn set_frequency(&mut self, hz: f32) {
        self.frequency = hz.max(0.0);
    }

    /// Force a pulse on the next sample.
    pub fn arm(&mut self) {
        self.phase = 1.0;
    }

    /// Quiescent state: phase 0, frequency 0.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.frequency = 0.0;
    }

    /// Current phase in `[0, 1]`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Current frequency.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Advance one sample.
    #[inline]
    pub fn process(&mut self, sample_rate: f32) -> f32 {
        self.phase += self.frequency / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= libm::floorf(self.phase);
            1.0
        } else {
            0.0
        }
    }
}

/// Velvet noise: one impulse of random sign and height per period, at a
/// random position inside the period.
#[derive(Debug, Clone)]
pub struct VelvetNoise {
    rng: fastrand::Rng,
    phase: f32,
    density: f32,
    position: f32,
    amplitude: f32,
    fired: bool,
}

impl VelvetNoise {
    /// New generator with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            phase: 0.0,
            density: 0.0,
            position: 0.0,
            amplitude: 0.0,
            fired: true,
        }
    }

    /// Impulses per second.
    pub fn set_density(&mut self, density: f32) {
        self.density = density.max(0.0);
    }

    /// Start a new period on the next sample.
    pub fn arm(&mut self) {
        self.phase = 1.0;
    }

    /// Restart the random sequence.
    pub fn reseed(&mut self, seed: u64) {
        self.rng.seed(seed);
    }

    /// Clear phase and pending impulse.
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.fired = true;
    }

    /// Advance one sample.
    #[inline]
    pub fn process(&mut self, sample_rate: f32) -> f32 {
        self.phase += self.density / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= libm::floorf(self.phase);
            self.position = self.rng.f32();
            self.amplitude = self.rng.f32() * 2.0 - 1.0;
            self.fired = false;
        }
        if !self.fired && self.phase >= self.position {
            self.fired = true;
            self.amplitude
        } else {
            0.0
        }
    }
}

/// Leaky Brownian walk folded back at `±1`.
#[derive(Debug, Clone)]
pub struct RandomWalk {
    rng: fastrand::Rng,
    value: f32,
    drift: f32,
}

impl RandomWalk {
    /// Per-sample leak toward zero.
    pub const LEAK: f32 = 0.9995;

    /// New generator with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            value: 0.0,
            drift: 0.0,
        }
    }

    /// Maximum step per sample.
    pub fn set_drift(&mut self, drift: f32) {
        self.drift = drift.max(0.0);
    }

    /// Restart the random sequence.
    pub fn reseed(&mut self, seed: u64) {
        self.rng.seed(seed);
    }

    /// Return to zero.
    pub fn reset(&mut self) {
        self.value = 0.0;
    }

    /// Advance one sample.
    #[inline]
    pub fn process(&mut self) -> f32 {
        let step = (self.rng.f32() * 2.0 - 1.0) * self.drift;
        let mut v = self.value * Self::LEAK + step;
        if v > 1.0 {
            v = 2.0 - v;
        } else if v < -1.0 {
            v = -2.0 - v;
        }
        self.value = v.clamp(-1.0, 1.0);
        self.value
    }
}

/// The three generators and the mode switch in front of them.
#[derive(Debug, Clone)]
pub struct OscillatorBank {
    sample_rate: f32,
    pulse: PulseOscillator,
    velvet: VelvetNoise,
    walk: RandomWalk,
}

impl OscillatorBank {
    /// New bank at `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            pulse: PulseOscillator::default(),
            velvet: VelvetNoise::new(0),
            walk: RandomWalk::new(0),
        }
    }

    /// Update the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Note-on: pulse and velvet fire on the next sample.
    pub fn note_on(&mut self) {
        self.pulse.arm();
        self.velvet.arm();
    }

    /// All notes released: the pulse goes quiet.
    pub fn release(&mut self) {
        self.pulse.reset();
    }

    /// No pitch this block.
    pub fn idle(&mut self) {
        self.pulse.set_frequency(0.0);
        self.velvet.set_density(0.0);
    }

    /// Reseed the noise generators from the engine random state.
    pub fn trigger(&mut self, random: &mut RandomState) {
        self.velvet.reseed(random.next_u64());
        self.walk.reseed(random.next_u64());
    }

    /// Clear all generator state.
    pub fn reset(&mut self) {
        self.pulse.reset();
        self.velvet.reset();
        self.walk.reset();
    }

    /// The pulse generator.
    pub fn pulse(&self) -> &PulseOscillator {
        &self.pulse
    }

    /// Render one sample of `mode` at the smoothed `pitch`.
    #[inline]
    pub fn process(&mut self, mode: OscillatorMode, pitch: f32) -> f32 {
        match mode {
            OscillatorMode::Off => 0.0,
            OscillatorMode::Impulse => self.pulse.process(self.sample_rate),
            OscillatorMode::Sustain => {
                self.pulse.set_frequency(pitch);
                self.pulse.process(self.sample_rate)
            }
            OscillatorMode::SparseNoise => {
                self.velvet.set_density(pitch);
                self.velvet.process(self.sample_rate)
            }
            OscillatorMode::RandomWalk => {
                self.walk.set_drift(2.0 * pitch / self.sample_rate);
                self.walk.process()
            }
        }
    }
}
