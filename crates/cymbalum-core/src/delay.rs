//! Fractional delay line for feedback combs.
//!
//! The excitation comb sweeps its delay time under LFO control, so reads
//! need sub-sample resolution. [`InterpolatedDelay`] is a circular buffer
//! sized once off the audio path and never reallocated afterwards.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Linearly interpolated delay line using a circular buffer (heap-allocated).
///
/// # Example
///
/// ```rust
/// use cymbalum_core::InterpolatedDelay;
///
/// let mut delay = InterpolatedDelay::from_time(48000.0, 0.01);
/// delay.write(1.0);
/// assert_eq!(delay.read(0.0), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct InterpolatedDelay {
    /// Circular buffer storage
    buffer: Vec<f32>,
    /// Write position in buffer
    write_pos: usize,
}

impl InterpolatedDelay {
    /// Creates a new delay line holding `max_delay_samples` samples.
    ///
    /// A zero size is raised to one sample.
    pub fn new(max_delay_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_delay_samples.max(1)],
            write_pos: 0,
        }
    }

    /// Creates a delay line from sample rate and max delay time in seconds.
    pub fn from_time(sample_rate: f32, max_seconds: f32) -> Self {
        let max_samples = (sample_rate * max_seconds) as usize + 2;
        #[cfg(feature = "tracing")]
        tracing::trace!(max_samples, sample_rate, "delay line allocated");
        Self::new(max_samples)
    }

    /// Reads a delayed sample.
    ///
    /// `delay_samples == 0.0` returns the most recently written sample.
    /// Delays beyond the capacity are clamped.
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        let delay_clamped = delay_samples.clamp(0.0, (len - 1) as f32);

        let delay_int = delay_clamped as usize;
        let frac = delay_clamped - delay_int as f32;

        // `delay_int` samples before the last written one.
        let read_pos = (self.write_pos + len - delay_int - 1) % len;

        let next_pos = (read_pos + len - 1) % len;
        let a = self.buffer[read_pos];
        let b = self.buffer[next_pos];
        a + (b - a) * frac
    }

    /// Writes a sample and advances the write position.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
    }

    /// Clears the delay line (sets all samples to 0).
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Returns the capacity in samples.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}
