//! Cymbalum Synth - Real-time cymbal synthesis engine
//!
//! This crate renders struck-metal sounds by exciting a bank of coupled,
//! damped string loops. Everything runs inside a host audio callback: after
//! [`Engine::setup`] nothing on the block path allocates, locks or fails.
//!
//! # Signal Chain
//!
//! ```text
//! notes ─▶ OscillatorBank ─┐
//!                          ├─▶ ExcitationFilter ─▶ ResonantBody ─▶ gain ─▶ bypass
//! input ───────────────────┘          ▲
//!                                 TempoLfo
//! ```
//!
//! # Core Components
//!
//! ## Engine
//!
//! - [`Engine`] - Variant-dispatched engine, the host-facing API
//! - [`DspCore`] - The signal chain at one lane width
//! - [`EngineVariant`] / [`CpuFeatures`] - Runtime variant selection
//!
//! ## Control
//!
//! - [`ParameterStore`] - Normalized parameter values and state codec
//! - [`Param`] / [`PARAMETERS`] - The parameter table
//! - [`NoteStack`] / [`EventScheduler`] - Held notes and sample-accurate events
//! - [`BypassCrossfader`] - Click-free bypass
//! - [`TableCommands`] - Out-of-band table rebuilds
//!
//! ## Synthesis
//!
//! - [`OscillatorBank`] - Impulse, pulse train, velvet noise, random walk
//! - [`ExcitationFilter`] - Randomized feedback comb
//! - [`ResonantBody`] - Coupled string and bandpass network
//! - [`RandomState`] - Seeded per-trigger variation
//!
//! # Example
//!
//! ```rust
//! use cymbalum_synth::{Engine, EngineOptions, Param, ParamUpdate};
//!
//! let mut engine = Engine::new(EngineOptions::default()).unwrap();
//! engine.setup(44100.0).unwrap();
//!
//! engine.update_parameters(&[ParamUpdate::new(Param::Decay, 0.5)]);
//! engine.push_midi_note(true, 32, 1, 60, 0.0, 0.9);
//! engine.set_parameters(None);
//!
//! let mut out = vec![0.0; 512];
//! engine.process(&[], &mut [out.as_mut_slice()]);
//! assert!(out.iter().all(|x| x.is_finite()));
//! ```

pub mod body;
pub mod bypass;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod excitation;
pub mod note;
pub mod oscillator;
pub mod params;
pub mod random;
pub mod tables;

pub use body::{BandpassLanes, BodySettings, CutoffMap, MAX_STACK, MAX_UNITS, ResonantBody};
pub use bypass::{BypassCrossfader, CrossfadeState, FADE_SECONDS};
pub use dispatch::{CpuFeatures, EngineVariant, select_variant};
pub use engine::{DEFAULT_SAMPLE_RATE, DspCore, Engine, EngineOptions};
pub use error::EngineError;
pub use excitation::{ExcitationFilter, MAX_COMB_TIME, MAX_FEEDBACK};
pub use note::{EventScheduler, MAX_EVENTS, MAX_NOTES, NoteEvent, NoteInfo, NoteStack};
pub use oscillator::{OscillatorBank, OscillatorMode, PulseOscillator, RandomWalk, VelvetNoise};
pub use params::{DecodeSummary, PARAM_COUNT, PARAMETERS, Param, ParamUpdate, ParameterStore};
pub use random::RandomState;
pub use tables::{DEFAULT_TEMPO, LFO_COMMAND, LFO_TABLE_SIZE, LfoTable, TableCommands, TempoLfo};

/// Re-export parameter metadata from cymbalum-core
pub use cymbalum_core::{ParamDescriptor, ParamFlags, ParamId, ParamScale, ParamUnit};
