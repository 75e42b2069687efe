//! Cymbalum Core - DSP primitives for the cymbalum synthesis engine
//!
//! This crate provides the small, allocation-free building blocks the engine
//! is assembled from. Everything here is safe to call from a real-time audio
//! callback once constructed.
//!
//! # Core Abstractions
//!
//! ## Effect System
//!
//! - [`Effect`] - Object-safe trait for single-input, single-output stages
//!
//! ## Parameter Smoothing
//!
//! - [`LinearSmoother`] - Linear ramps that land exactly on the target
//!
//! ## Parameter Metadata
//!
//! - [`ParamDescriptor`] - Range, default, curve and flags of one parameter
//! - [`ParamScale`] - Normalization curves (linear, logarithmic, power)
//!
//! ## Filters
//!
//! - [`Biquad`] - Second-order IIR filter with RBJ cookbook coefficients
//! - [`OnePole`] - 6 dB/oct lowpass for feedback coloration
//!
//! ## Delay Lines
//!
//! - [`InterpolatedDelay`] - Variable-length delay with interpolation
//!
//! ## Utilities
//!
//! - Pitch helpers: [`midi_to_frequency`], [`cents_to_ratio`]
//! - Signal helpers: [`flush_denormal`], [`hard_clip`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! cymbalum-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod delay;
pub mod effect;
pub mod math;
pub mod one_pole;
pub mod param;
pub mod param_info;

// Re-export main types at crate root
pub use biquad::{Biquad, BiquadCoefficients, bandpass_coefficients};
pub use delay::InterpolatedDelay;
pub use effect::Effect;
pub use math::{cents_to_ratio, flush_denormal, hard_clip, midi_to_frequency};
pub use one_pole::OnePole;
pub use param::LinearSmoother;
pub use param_info::{ParamDescriptor, ParamFlags, ParamId, ParamScale, ParamUnit};
