//! Feedback comb that shapes the excitation before it reaches the body.
//!
//! ```text
//! y[n] = x[n] + feedback * color(y[n - T])
//! ```
//!
//! `T` is the comb time in samples. At each trigger the time is perturbed by
//! up to ±10 % and the feedback by up to ±5 %, both scaled by the
//! randomization amount. The tempo-synced LFO sweeps `T` by up to ±50 %
//! through [`ExcitationFilter::set_modulation`]. `color` is a one-pole
//! lowpass in the loop.

use cymbalum_core::{Effect, InterpolatedDelay, OnePole, flush_denormal};

use crate::random::RandomState;

/// Longest comb time the parameter allows, in seconds.
pub const MAX_COMB_TIME: f32 = 0.1;

/// Upper bound on comb feedback.
pub const MAX_FEEDBACK: f32 = 0.9999;

/// Cutoff of the coloration lowpass inside the loop.
const COLOR_CUTOFF_HZ: f32 = 12000.0;

/// Headroom for randomization (+10 %) and LFO sweep (+50 %).
const DELAY_HEADROOM: f32 = 1.1 * 1.5 + 0.05;

/// Randomized feedback comb.
#[derive(Debug, Clone)]
pub struct ExcitationFilter {
    sample_rate: f32,
    delay: InterpolatedDelay,
    color: OnePole,
    /// Configured comb time and feedback, before randomization.
    base_time: f32,
    base_feedback: f32,
    amount: f32,
    /// Raw trigger offsets in `[-1, 1)`.
    time_offset: f32,
    feedback_offset: f32,
    /// Effective values.
    time: f32,
    feedback: f32,
    modulation: f32,
}

impl ExcitationFilter {
    /// New comb at `sample_rate` with a 2 ms, 0.3 feedback setting.
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            sample_rate,
            delay: InterpolatedDelay::from_time(sample_rate, MAX_COMB_TIME * DELAY_HEADROOM),
            color: OnePole::new(sample_rate, color_cutoff(sample_rate)),
            base_time: 0.002,
            base_feedback: 0.3,
            amount: 0.0,
            time_offset: 0.0,
            feedback_offset: 0.0,
            time: 0.002,
            feedback: 0.3,
            modulation: 0.0,
        };
        filter.update();
        filter
    }

    /// Set comb time (seconds), feedback and randomization amount.
    pub fn configure(&mut self, time: f32, feedback: f32, random_amount: f32) {
        self.base_time = time.clamp(0.0, MAX_COMB_TIME);
        self.base_feedback = feedback;
        self.amount = random_amount.clamp(0.0, 1.0);
        self.update();
    }

    /// Draw new per-trigger offsets.
    pub fn trigger(&mut self, random: &mut RandomState) {
        self.time_offset = random.bipolar();
        self.feedback_offset = random.bipolar();
        self.update();
    }

    /// Relative comb time sweep, clamped to `[-0.5, 0.5]`.
    #[inline]
    pub fn set_modulation(&mut self, amount: f32) {
        self.modulation = amount.clamp(-0.5, 0.5);
    }

    /// Effective comb time in seconds, after randomization.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Effective feedback, after randomization.
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    fn update(&mut self) {
        self.time = self.base_time * (1.0 + 0.1 * self.amount * self.time_offset);
        let feedback = self.base_feedback * (1.0 + 0.05 * self.amount * self.feedback_offset);
        self.feedback = feedback.clamp(0.0, MAX_FEEDBACK);
    }

    #[inline]
    fn delay_samples(&self) -> f32 {
        let samples = self.time * (1.0 + self.modulation) * self.sample_rate;
        // Very low rates leave fewer than three slots.
        let upper = self.delay.capacity().saturating_sub(2).max(1) as f32;
        samples.max(1.0).min(upper)
    }
}

impl Effect for ExcitationFilter {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.delay.read(self.delay_samples() - 1.0);
        let output = flush_denormal(input + self.feedback * self.color.process(delayed));
        self.delay.write(output);
        output
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.delay = InterpolatedDelay::from_time(sample_rate, MAX_COMB_TIME * DELAY_HEADROOM);
        self.color = OnePole::new(sample_rate, color_cutoff(sample_rate));
    }

    fn reset(&mut self) {
        self.delay.clear();
        self.color.reset();
        self.modulation = 0.0;
    }
}

fn color_cutoff(sample_rate: f32) -> f32 {
    COLOR_CUTOFF_HZ.min(sample_rate * 0.45)
}
