//! The [`Effect`] trait for mono, sample-at-a-time processing stages.
//!
//! Stages in the synthesis chain (for example the excitation comb) implement
//! this trait so they can be driven the same way from the engine, from
//! benches and from tests.
//!
//! All methods are expected to be real-time safe: no allocation, no locking.

/// Core trait for single-input, single-output processing stages.
///
/// # Example
///
/// ```rust
/// use cymbalum_core::Effect;
///
/// struct Gain {
///     gain: f32,
/// }
///
/// impl Effect for Gain {
///     fn process(&mut self, input: f32) -> f32 {
///         input * self.gain
///     }
///
///     fn set_sample_rate(&mut self, _sample_rate: f32) {}
///
///     fn reset(&mut self) {}
/// }
///
/// let mut g = Gain { gain: 0.5 };
/// assert_eq!(g.process(2.0), 1.0);
/// ```
pub trait Effect {
    /// Process a single sample.
    fn process(&mut self, input: f32) -> f32;

    /// Update the sample rate.
    ///
    /// May allocate; never called from the audio path.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Clear internal state without changing parameters.
    fn reset(&mut self);
}
