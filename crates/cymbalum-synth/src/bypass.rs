//! Click-free bypass.
//!
//! A four-state machine that ramps the output linearly over
//! `floor(0.04 * sample_rate)` samples when bypass engages or releases.
//! Transitions are evaluated once per block by [`BypassCrossfader::set_bypass`];
//! [`BypassCrossfader::gain`] advances the ramp once per sample.
//!
//! ```text
//!            bypass                 counter == 0
//!   Active ──────────▶ FadingOut ───────────────▶ Bypassed
//!     ▲                   │  ▲                       │
//!     │ counter == len    │  │ bypass                │ !bypass
//!     │                   ▼  │                       │
//!     └─────────────── FadingIn ◀────────────────────┘
//! ```
//!
//! The counter steps before the gain is read, so with `len` the fade length
//! a fade-out yields `(len-1)/len, (len-2)/len, ..., 0` and a fade-in yields
//! `1/len, ..., 1`. Neither ramp repeats its starting gain.

/// Fade duration in seconds.
pub const FADE_SECONDS: f32 = 0.04;

/// Crossfader state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossfadeState {
    /// Output ramps toward silence
    FadingOut,
    /// Processing skipped, output silent
    Bypassed,
    /// Output ramps toward full level
    FadingIn,
    /// Full processing at unity gain
    Active,
}

/// Bypass ramp with a bounded counter in `[0, fade_length]`.
///
/// # Example
///
/// ```rust
/// use cymbalum_synth::{BypassCrossfader, CrossfadeState};
///
/// let mut fader = BypassCrossfader::new(1000.0);
/// assert_eq!(fader.fade_length(), 40);
///
/// fader.set_bypass(true);
/// for _ in 0..40 {
///     fader.gain();
/// }
/// assert_eq!(fader.state(), CrossfadeState::Bypassed);
/// ```
#[derive(Debug, Clone)]
pub struct BypassCrossfader {
    state: CrossfadeState,
    counter: u32,
    fade_length: u32,
}

impl BypassCrossfader {
    /// New crossfader, active, sized for `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        let fade_length = fade_length(sample_rate);
        Self {
            state: CrossfadeState::Active,
            counter: fade_length,
            fade_length,
        }
    }

    /// Resize the fade for a new sample rate and return to `Active`.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        *self = Self::new(sample_rate);
    }

    /// Apply the block's bypass flag.
    pub fn set_bypass(&mut self, bypass: bool) {
        self.state = match (self.state, bypass) {
            (CrossfadeState::Active | CrossfadeState::FadingIn, true) => CrossfadeState::FadingOut,
            (CrossfadeState::Bypassed | CrossfadeState::FadingOut, false) => {
                CrossfadeState::FadingIn
            }
            (state, _) => state,
        };
    }

    /// Advance one sample and return the gain to apply.
    #[inline]
    pub fn gain(&mut self) -> f32 {
        match self.state {
            CrossfadeState::Active => 1.0,
            CrossfadeState::Bypassed => 0.0,
            CrossfadeState::FadingOut => {
                self.counter = self.counter.saturating_sub(1);
                if self.counter == 0 {
                    self.state = CrossfadeState::Bypassed;
                }
                self.counter as f32 / self.fade_length as f32
            }
            CrossfadeState::FadingIn => {
                self.counter = (self.counter + 1).min(self.fade_length);
                if self.counter == self.fade_length {
                    self.state = CrossfadeState::Active;
                }
                self.counter as f32 / self.fade_length as f32
            }
        }
    }

    /// Whether synthesis is skipped this block.
    pub fn is_bypassed(&self) -> bool {
        self.state == CrossfadeState::Bypassed
    }

    /// Whether the output must be multiplied by [`gain`](Self::gain).
    ///
    /// Only `Active` runs at unity. A fade that ends mid-block in `Bypassed`
    /// keeps returning zero for the rest of the block.
    pub fn needs_gain(&self) -> bool {
        self.state != CrossfadeState::Active
    }

    /// Current state.
    pub fn state(&self) -> CrossfadeState {
        self.state
    }

    /// Ramp position.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Ramp length in samples.
    pub fn fade_length(&self) -> u32 {
        self.fade_length
    }
}

fn fade_length(sample_rate: f32) -> u32 {
    (libm::floorf(FADE_SECONDS * sample_rate) as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_length_from_sample_rate() {
        assert_eq!(BypassCrossfader::new(48000.0).fade_length(), 1920);
        assert_eq!(BypassCrossfader::new(44100.0).fade_length(), 1764);
        assert_eq!(BypassCrossfader::new(1.0).fade_length(), 1);
    }

    #[test]
    fn fade_out_is_linear_and_ends_bypassed() {
        let mut fader = BypassCrossfader::new(48000.0);
        let len = fader.fade_length();
        fader.set_bypass(true);

        let mut previous = 1.0;
        for i in 1..=len {
            let g = fader.gain();
            let expected = (len - i) as f32 / len as f32;
            assert_eq!(g, expected, "Gain at step {i}");
            assert!(g < previous);
            previous = g;
        }
        assert_eq!(fader.state(), CrossfadeState::Bypassed);
        assert_eq!(fader.counter(), 0);
        assert_eq!(fader.gain(), 0.0);
    }

    #[test]
    fn fade_in_reverses() {
        let mut fader = BypassCrossfader::new(1000.0);
        fader.set_bypass(true);
        for _ in 0..fader.fade_length() {
            fader.gain();
        }
        fader.set_bypass(false);
        assert_eq!(fader.state(), CrossfadeState::FadingIn);

        let gains: Vec<f32> = (0..fader.fade_length()).map(|_| fader.gain()).collect();
        assert_eq!(gains.first().copied(), Some(1.0 / 40.0));
        assert_eq!(gains.last().copied(), Some(1.0));
        assert_eq!(fader.state(), CrossfadeState::Active);
        assert!(!fader.needs_gain());
    }

    #[test]
    fn reversal_mid_fade_keeps_counter() {
        let mut fader = BypassCrossfader::new(1000.0);
        fader.set_bypass(true);
        for _ in 0..10 {
            fader.gain();
        }
        assert_eq!(fader.counter(), 30);
        fader.set_bypass(false);
        assert_eq!(fader.gain(), 31.0 / 40.0);
    }

    #[test]
    fn steady_states_ignore_matching_flag() {
        let mut fader = BypassCrossfader::new(1000.0);
        fader.set_bypass(false);
        assert_eq!(fader.state(), CrossfadeState::Active);
        assert_eq!(fader.gain(), 1.0);

        fader.set_bypass(true);
        for _ in 0..40 {
            fader.gain();
        }
        fader.set_bypass(true);
        assert!(fader.is_bypassed());
        assert_eq!(fader.counter(), 0);
    }

    #[test]
    fn counter_stays_in_range() {
        let mut fader = BypassCrossfader::new(1000.0);
        for block in 0..50 {
            fader.set_bypass(block % 3 == 0);
            for _ in 0..7 {
                fader.gain();
                assert!(fader.counter() <= fader.fade_length());
            }
        }
    }
}
