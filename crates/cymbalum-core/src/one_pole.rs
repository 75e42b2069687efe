//! One-pole lowpass filter for feedback coloration.
//!
//! A single-pole IIR lowpass with the difference equation:
//!
//! ```text
//! y[n] = x[n] + coeff * (y[n-1] - x[n])
//! ```
//!
//! The coefficient is either derived from a cutoff
//! (`coeff = exp(-2π * freq / sample_rate)`) or set directly, which is how
//! damping amounts in `[0, 1)` are applied inside feedback loops.
//!
//! # Usage
//!
//! ```rust
//! use cymbalum_core::OnePole;
//!
//! let mut lp = OnePole::new(48000.0, 4000.0);
//! let filtered = lp.process(1.0);
//! assert!(filtered < 1.0);
//! ```

use crate::flush_denormal;
use libm::expf;

/// One-pole (6 dB/oct) lowpass filter.
///
/// # Invariants
///
/// - `coeff` is always in [0, 1) for stable operation
/// - `state` is flushed to zero when below 1e-20 (denormal protection)
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f32,
    coeff: f32,
}

impl OnePole {
    /// Create a new one-pole lowpass filter.
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Sample rate in Hz
    /// * `freq_hz` - Cutoff frequency in Hz
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        let mut filter = Self::with_coefficient(0.0);
        filter.set_frequency(sample_rate, freq_hz);
        filter
    }

    /// Create a filter with an explicit pole position.
    pub fn with_coefficient(coeff: f32) -> Self {
        Self {
            state: 0.0,
            coeff: clamp_coeff(coeff),
        }
    }

    /// Set the cutoff frequency.
    pub fn set_frequency(&mut self, sample_rate: f32, freq_hz: f32) {
        self.coeff = clamp_coeff(expf(-core::f32::consts::TAU * freq_hz / sample_rate));
    }

    /// Set the pole position directly. `0.0` is a wire.
    pub fn set_coefficient(&mut self, coeff: f32) {
        self.coeff = clamp_coeff(coeff);
    }

    /// Current pole position.
    pub fn coefficient(&self) -> f32 {
        self.coeff
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state = flush_denormal(input + self.coeff * (self.state - input));
        self.state
    }

    /// Reset filter state to zero.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

impl Default for OnePole {
    fn default() -> Self {
        Self::with_coefficient(0.0)
    }
}

#[inline]
fn clamp_coeff(coeff: f32) -> f32 {
    if coeff.is_finite() {
        coeff.clamp(0.0, 0.9999)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_dc() {
        let mut lp = OnePole::new(48000.0, 1000.0);
        let mut out = 0.0;
        for _ in 0..48000 {
            out = lp.process(1.0);
        }
        assert!((out - 1.0).abs() < 1e-4, "DC should pass through, got {out}");
    }

    #[test]
    fn attenuates_nyquist() {
        let mut lp = OnePole::with_coefficient(0.9);
        let mut sum = 0.0f32;
        for i in 0..4800 {
            let input = if i % 2 == 0 { 1.0 } else { -1.0 };
            sum += lp.process(input).abs();
        }
        let avg = sum / 4800.0;
        assert!(avg < 0.1, "Nyquist should be attenuated, avg = {avg}");
    }

    #[test]
    fn zero_coefficient_is_wire() {
        let mut lp = OnePole::with_coefficient(0.0);
        assert_eq!(lp.process(0.3), 0.3);
        assert_eq!(lp.process(-0.8), -0.8);
    }

    #[test]
    fn coefficient_is_clamped() {
        assert!(OnePole::with_coefficient(1.5).coefficient() < 1.0);
        assert_eq!(OnePole::with_coefficient(f32::NAN).coefficient(), 0.0);
    }

    #[test]
    fn reset_clears_state() {
        let mut lp = OnePole::new(48000.0, 1000.0);
        lp.process(1.0);
        lp.reset();
        assert_eq!(lp.process(0.0), 0.0);
    }
}
