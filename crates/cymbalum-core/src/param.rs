//! Linear parameter smoothing for zipper-free changes.
//!
//! Control values (gain, pitch) arrive once per block but are consumed once
//! per sample. [`LinearSmoother`] spreads every jump over a fixed time so
//! the audio path never sees a step.
//!
//! ## Ramp Length
//!
//! A push to a new target schedules `max(1, ceil(T * R))` steps, where `T` is
//! the smoothing time in seconds and `R` the sample rate. The per-sample
//! increment is therefore `|target - current| / max(1, T * R)`, and the value
//! lands exactly on the target on the final step.
//!
//! ## Usage
//!
//! ```rust
//! use cymbalum_core::LinearSmoother;
//!
//! let mut gain = LinearSmoother::new(0.0);
//! gain.set_sample_rate(48000.0);
//! gain.set_time(0.01); // 10 ms
//!
//! gain.push(1.0);
//! for _ in 0..480 {
//!     let _g = gain.process();
//! }
//! assert_eq!(gain.value(), 1.0);
//! ```

use libm::ceilf;

/// A value that ramps linearly toward its most recently pushed target.
///
/// # Invariants
///
/// - The current value never passes the target, for rising and falling ramps.
/// - Re-timing or re-rating only affects the remaining distance; the current
///   value is never reset.
#[derive(Debug, Clone)]
pub struct LinearSmoother {
    /// Current value
    current: f32,
    /// Target value
    target: f32,
    /// Signed increment per sample
    increment: f32,
    /// Samples remaining until target reached
    remaining: u32,
    /// Sample rate in Hz
    sample_rate: f32,
    /// Ramp time in seconds
    time: f32,
}

impl LinearSmoother {
    /// Create a smoother resting at `initial`.
    ///
    /// Defaults to 44.1 kHz and a 20 ms ramp.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            remaining: 0,
            sample_rate: 44100.0,
            time: 0.02,
        }
    }

    /// Create with full configuration.
    pub fn with_config(initial: f32, sample_rate: f32, time: f32) -> Self {
        let mut smoother = Self::new(initial);
        smoother.sample_rate = sample_rate;
        smoother.time = time.max(0.0);
        smoother
    }

    /// Number of steps a full ramp takes at the current settings.
    #[inline]
    pub fn ramp_samples(&self) -> u32 {
        let samples = ceilf(self.time * self.sample_rate);
        if samples.is_finite() && samples > 1.0 {
            samples as u32
        } else {
            1
        }
    }

    /// Set a new destination.
    ///
    /// The ramp starts from the current value, so pushing while a ramp is in
    /// flight bends it toward the new target without a jump.
    pub fn push(&mut self, target: f32) {
        self.target = target;
        self.retarget();
    }

    /// Set the ramp time in seconds.
    pub fn set_time(&mut self, seconds: f32) {
        self.time = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self.retarget();
    }

    /// Update the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.retarget();
    }

    /// Snap to `value` with no ramp.
    pub fn reset(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.increment = 0.0;
        self.remaining = 0;
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn process(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            if self.remaining == 0 {
                self.current = self.target;
            } else {
                let next = self.current + self.increment;
                self.current = if self.increment > 0.0 {
                    next.min(self.target)
                } else {
                    next.max(self.target)
                };
            }
        }
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn value(&self) -> f32 {
        self.current
    }

    /// Destination of the active ramp.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether the ramp has finished.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.remaining == 0
    }

    fn retarget(&mut self) {
        let distance = self.target - self.current;
        if distance == 0.0 {
            self.increment = 0.0;
            self.remaining = 0;
            return;
        }
        let steps = self.ramp_samples();
        self.increment = distance / steps as f32;
        self.remaining = steps;
    }
}

impl Default for LinearSmoother {
    fn default() -> Self {
        Self::new(0.0)
    }
}
