//! Mathematical utility functions for DSP.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Pitch
//!
//! - [`midi_to_frequency`] - MIDI note plus cents of tuning to Hz
//! - [`cents_to_ratio`] - Frequency ratio for a cent offset
//!
//! # Utilities
//!
//! - [`hard_clip`] - Symmetric clipping
//! - [`flush_denormal`] - Denormal protection for feedback paths

use libm::exp2f;

/// Reference pitch of MIDI note 69.
pub const A4_FREQUENCY: f32 = 440.0;

/// Convert a MIDI note number and tuning offset to frequency.
///
/// `440 * 2^(((pitch - 69) * 100 + tuning_cents) / 1200)`
///
/// # Example
///
/// ```rust
/// use cymbalum_core::midi_to_frequency;
///
/// assert!((midi_to_frequency(69, 0.0) - 440.0).abs() < 1e-3);
/// assert!((midi_to_frequency(81, 0.0) - 880.0).abs() < 1e-2);
/// assert!((midi_to_frequency(69, 1200.0) - 880.0).abs() < 1e-2);
/// ```
#[inline]
pub fn midi_to_frequency(pitch: i16, tuning_cents: f32) -> f32 {
    let cents = f32::from(pitch - 69) * 100.0 + tuning_cents;
    A4_FREQUENCY * exp2f(cents / 1200.0)
}

/// Frequency ratio for an offset in cents (`2^(cents / 1200)`).
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    exp2f(cents / 1200.0)
}

/// Symmetric hard clip to `[-threshold, threshold]`.
#[inline]
pub fn hard_clip(x: f32, threshold: f32) -> f32 {
    x.clamp(-threshold, threshold)
}

/// Flush denormal numbers to zero.
///
/// Replaces values below 1e-20 with zero. Use in feedback loops where the
/// signal can decay indefinitely toward zero.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concert_a() {
        assert!((midi_to_frequency(69, 0.0) - 440.0).abs() < 1e-4);
    }

    #[test]
    fn frequency_is_monotonic_in_pitch() {
        let mut prev = 0.0;
        for pitch in 0..128 {
            let f = midi_to_frequency(pitch, 0.0);
            assert!(f > prev, "pitch {pitch} should be above {prev}, got {f}");
            prev = f;
        }
    }

    #[test]
    fn tuning_shifts_by_cents() {
        let up = midi_to_frequency(60, 100.0);
        let next = midi_to_frequency(61, 0.0);
        assert!((up - next).abs() < 1e-3);
    }

    #[test]
    fn cents_ratio_octave() {
        assert!((cents_to_ratio(1200.0) - 2.0).abs() < 1e-6);
        assert!((cents_to_ratio(-1200.0) - 0.5).abs() < 1e-6);
        assert_eq!(cents_to_ratio(0.0), 1.0);
    }

    #[test]
    fn clip_is_symmetric() {
        assert_eq!(hard_clip(2.0, 1.0), 1.0);
        assert_eq!(hard_clip(-0.3, 0.2), -0.2);
    }

    #[test]
    fn denormals_flushed() {
        assert_eq!(flush_denormal(1e-30), 0.0);
        assert_eq!(flush_denormal(1e-10), 1e-10);
    }
}
