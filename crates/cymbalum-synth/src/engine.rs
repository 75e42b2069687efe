//! The synthesis engine.
//!
//! [`DspCore`] is the whole signal chain at one lane width. [`Engine`] owns
//! exactly one core, chosen at construction by [`select_variant`], and
//! forwards every call to it with a single `match`.
//!
//! # Block Protocol
//!
//! The host glue drives the engine once per audio callback:
//!
//! 1. [`Engine::update_parameters`] with the block's normalized changes
//! 2. [`Engine::push_midi_note`] for each note event
//! 3. [`Engine::set_parameters`] to read the store and consume triggers
//! 4. [`Engine::process`] to render the block
//!
//! Steps 1 to 4 never allocate, lock or fail.
//!
//! # Example
//!
//! ```rust
//! use cymbalum_synth::{Engine, EngineOptions};
//!
//! let mut engine = Engine::new(EngineOptions::default()).unwrap();
//! engine.push_midi_note(true, 0, -1, 60, 0.0, 1.0);
//! engine.set_parameters(Some(120.0));
//!
//! let mut left = vec![0.0; 256];
//! let mut right = vec![0.0; 256];
//! engine.process(&[], &mut [left.as_mut_slice(), right.as_mut_slice()]);
//! assert_eq!(left, right);
//! ```

use cymbalum_core::{Effect, LinearSmoother, cents_to_ratio};
use tracing::{debug, info, warn};

use crate::body::{BodySettings, CutoffMap, ResonantBody};
use crate::bypass::{BypassCrossfader, CrossfadeState};
use crate::dispatch::{CpuFeatures, EngineVariant, select_variant};
use crate::error::EngineError;
use crate::excitation::ExcitationFilter;
use crate::note::{EventScheduler, NoteEvent, NoteStack};
use crate::oscillator::{OscillatorBank, OscillatorMode};
use crate::params::{DecodeSummary, Param, ParamUpdate, ParameterStore};
use crate::random::RandomState;
use crate::tables::{TableCommands, TempoLfo};

/// Default sample rate before [`Engine::setup`].
pub const DEFAULT_SAMPLE_RATE: f32 = 48000.0;

/// Construction options.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Variants to try, in order. The first supported one is used.
    pub candidates: Vec<EngineVariant>,
    /// Initial sample rate
    pub sample_rate: f32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            candidates: EngineVariant::ALL.to_vec(),
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

/// Per-block values read once by `set_parameters`.
#[derive(Debug, Clone, Copy)]
struct BlockState {
    mode: OscillatorMode,
    excitation: bool,
    collision: bool,
    lfo_depth: f32,
    bend_ratio: f32,
}

impl Default for BlockState {
    fn default() -> Self {
        Self {
            mode: OscillatorMode::default(),
            excitation: true,
            collision: true,
            lfo_depth: 0.0,
            bend_ratio: 1.0,
        }
    }
}

/// Oscillators, excitation comb and resonant body at `LANES` units per
/// inner loop.
#[derive(Debug)]
pub struct DspCore<const LANES: usize> {
    sample_rate: f32,
    params: ParameterStore,
    notes: NoteStack,
    events: EventScheduler,
    random: RandomState,
    oscillators: OscillatorBank,
    excitation: ExcitationFilter,
    body: ResonantBody<LANES>,
    bypass: BypassCrossfader,
    lfo: TempoLfo,
    gain: LinearSmoother,
    pitch: LinearSmoother,
    /// Set by note-on, consumed by the next `set_parameters`.
    trigger: bool,
    block: BlockState,
    /// Velocity of the most recent note.
    velocity: f32,
    tables: TableCommands,
}

impl<const LANES: usize> DspCore<LANES> {
    /// Build a core at `sample_rate` with default parameters.
    pub fn new(sample_rate: f32) -> Self {
        let params = ParameterStore::new();
        let smoothness = params.get(Param::Smoothness);
        Self {
            sample_rate,
            gain: LinearSmoother::with_config(params.get(Param::Gain), sample_rate, smoothness),
            pitch: LinearSmoother::with_config(0.0, sample_rate, smoothness),
            random: RandomState::new(u64::from(params.get_int(Param::Seed))),
            params,
            notes: NoteStack::new(),
            events: EventScheduler::new(),
            oscillators: OscillatorBank::new(sample_rate),
            excitation: ExcitationFilter::new(sample_rate),
            body: ResonantBody::new(sample_rate),
            bypass: BypassCrossfader::new(sample_rate),
            lfo: TempoLfo::new(sample_rate),
            trigger: false,
            block: BlockState::default(),
            velocity: 0.0,
            tables: TableCommands::new(),
        }
    }

    /// Resize everything for `sample_rate`. May allocate.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidSampleRate`] if the rate is not finite or not
    /// positive. The core is left unchanged.
    pub fn setup(&mut self, sample_rate: f32) -> Result<(), EngineError> {
        validate_sample_rate(sample_rate)?;
        self.sample_rate = sample_rate;
        self.oscillators.set_sample_rate(sample_rate);
        self.excitation.set_sample_rate(sample_rate);
        self.body.set_sample_rate(sample_rate);
        self.bypass.set_sample_rate(sample_rate);
        self.lfo.set_sample_rate(sample_rate);
        self.gain.set_sample_rate(sample_rate);
        self.pitch.set_sample_rate(sample_rate);
        debug!(
            sample_rate,
            fade_length = self.bypass.fade_length(),
            lanes = LANES,
            "engine setup"
        );
        Ok(())
    }

    /// Clear all signal state, release every note and restart the random
    /// sequence.
    pub fn reset(&mut self) {
        self.excitation.reset();
        self.body.reset();
        self.oscillators.reset();
        self.lfo.reset();
        self.notes.clear();
        self.events.clear();
        self.trigger = false;
        self.velocity = 0.0;
        self.gain.reset(self.params.get(Param::Gain));
        self.pitch.reset(0.0);
        self.startup();
    }

    /// Transport start: reseed the random state from the `seed` parameter.
    pub fn startup(&mut self) {
        self.random.reseed(u64::from(self.params.get_int(Param::Seed)));
    }

    /// Store normalized updates. They take effect at the next
    /// [`set_parameters`](Self::set_parameters).
    pub fn update_parameters(&mut self, updates: &[ParamUpdate]) {
        self.params.apply(updates);
    }

    /// Read the parameter store for the coming block.
    ///
    /// Pushes smoother targets, consumes a pending trigger, reconfigures the
    /// excitation comb and the body, and updates the LFO tempo. `None` keeps
    /// the last known tempo.
    pub fn set_parameters(&mut self, tempo: Option<f64>) {
        let p = &self.params;

        let smoothness = p.get(Param::Smoothness);
        self.gain.set_time(smoothness);
        self.pitch.set_time(smoothness);
        self.gain.push(p.get(Param::Gain));

        if self.trigger {
            self.trigger = false;
            if p.get_bool(Param::Retrigger) {
                self.random.reseed(u64::from(p.get_int(Param::Seed)));
            }
            self.oscillators.trigger(&mut self.random);
            self.excitation.trigger(&mut self.random);
            self.body.trigger(&mut self.random);
        }

        self.excitation.configure(
            p.get(Param::CombTime),
            p.get(Param::CombFeedback),
            p.get(Param::RandomAmount),
        );
        self.body.configure(&body_settings(p));

        self.block = BlockState {
            mode: OscillatorMode::from_index(p.get_int(Param::OscType)),
            excitation: p.get_bool(Param::Excitation),
            collision: p.get_bool(Param::Collision),
            lfo_depth: p.get(Param::LfoDepth),
            bend_ratio: cents_to_ratio(p.get(Param::PitchBend)),
        };

        match self.notes.current() {
            Some(note) if self.block.mode.uses_pitch() => {
                self.pitch.push(note.frequency * self.block.bend_ratio);
            }
            _ => {
                self.oscillators.idle();
                self.pitch.push(0.0);
            }
        }

        self.lfo.set_tempo(tempo);
        self.lfo.set_beats(p.get(Param::LfoBeats));
        self.bypass.set_bypass(p.get_bool(Param::Bypass));
    }

    /// Queue a note event for the current block.
    ///
    /// Returns `false` if the event queue was full and the event dropped.
    pub fn push_midi_note(
        &mut self,
        is_note_on: bool,
        sample_offset: u32,
        note_id: i32,
        pitch: i16,
        tuning: f32,
        velocity: f32,
    ) -> bool {
        self.events.push(NoteEvent {
            is_note_on,
            offset: sample_offset,
            id: NoteEvent::host_id(note_id, pitch),
            pitch,
            tuning,
            velocity,
        })
    }

    /// Render `outputs[0].len()` samples.
    ///
    /// Inputs are averaged into one excitation signal; missing samples count
    /// as silence. The result is copied to every output channel. While
    /// bypassed, note events are still applied but nothing is synthesized.
    pub fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]]) {
        let Some((first, rest)) = outputs.split_first_mut() else {
            self.drain_events();
            return;
        };
        let len = first.len();

        if self.bypass.is_bypassed() {
            first.fill(0.0);
        } else {
            let table = self.tables.load_lfo();
            let block = self.block;

            for (i, out) in first.iter_mut().enumerate() {
                while let Some(event) = self.events.next_due(i, len) {
                    self.apply_event(&event);
                }

                let pitch = self.pitch.process();
                let generated = self.oscillators.process(block.mode, pitch) * self.velocity;
                let mut x = generated + mono_input(inputs, i);

                let lfo = self.lfo.process(&table);
                self.excitation.set_modulation(lfo * block.lfo_depth * 0.5);
                if block.excitation {
                    x = self.excitation.process(x);
                }

                let mut y = self.body.process(x, block.collision) * self.gain.process();
                if self.bypass.needs_gain() {
                    y *= self.bypass.gain();
                }
                *out = y;
            }
        }
        self.drain_events();

        for channel in rest {
            let n = channel.len().min(len);
            channel[..n].copy_from_slice(&first[..n]);
            channel[n..].fill(0.0);
        }
    }

    fn drain_events(&mut self) {
        while let Some(event) = self.events.next_pending() {
            self.apply_event(&event);
        }
        self.events.clear();
    }

    fn apply_event(&mut self, event: &NoteEvent) {
        if event.is_note_on {
            self.notes.push(event.note_info());
            self.oscillators.note_on();
            // Coefficients are redrawn at the next set_parameters; the signal
            // state restarts here.
            self.excitation.reset();
            self.body.reset();
            self.velocity = event.velocity.clamp(0.0, 1.0);
            self.trigger = true;
        } else {
            if !self.notes.release(event.id) {
                return;
            }
            match self.notes.current() {
                Some(note) => self.velocity = note.velocity.clamp(0.0, 1.0),
                None => {
                    self.oscillators.release();
                    self.pitch.reset(0.0);
                }
            }
        }

        if self.block.mode.uses_pitch()
            && let Some(note) = self.notes.current()
        {
            self.pitch.push(note.frequency * self.block.bend_ratio);
        }
    }

    /// Serialize the parameter store.
    pub fn encode_state(&self) -> Vec<u8> {
        self.params.encode_state()
    }

    /// Restore the parameter store from a state blob. Never fails.
    pub fn decode_state(&mut self, bytes: &[u8]) -> DecodeSummary {
        let summary = self.params.decode_into(bytes);
        if summary.defaulted > 0 {
            warn!(
                read = summary.read,
                defaulted = summary.defaulted,
                ignored_bytes = summary.ignored_bytes,
                "state decoded with defaults substituted"
            );
        } else {
            debug!(
                read = summary.read,
                ignored_bytes = summary.ignored_bytes,
                "state decoded"
            );
        }
        summary
    }

    /// The parameter store.
    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    /// Mutable parameter store, for control-thread setup.
    pub fn params_mut(&mut self) -> &mut ParameterStore {
        &mut self.params
    }

    /// Held notes.
    pub fn notes(&self) -> &NoteStack {
        &self.notes
    }

    /// Handle for out-of-band table rebuilds.
    pub fn table_commands(&self) -> TableCommands {
        self.tables.clone()
    }

    /// Current sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Bypass state.
    pub fn crossfade_state(&self) -> CrossfadeState {
        self.bypass.state()
    }

    /// Pitch the smoother is heading to.
    pub fn pitch_target(&self) -> f32 {
        self.pitch.target()
    }

    /// Note events dropped because the queue was full.
    pub fn dropped_events(&self) -> u64 {
        self.events.dropped()
    }
}

fn validate_sample_rate(sample_rate: f32) -> Result<(), EngineError> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidSampleRate(sample_rate))
    }
}

fn body_settings(p: &ParameterStore) -> BodySettings {
    BodySettings {
        units: p.get_int(Param::Units) as usize,
        stack: p.get_int(Param::Stack) as usize,
        min_frequency: p.get(Param::MinFrequency),
        max_frequency: p.get(Param::MaxFrequency),
        distance: p.get(Param::Distance),
        damping: p.get(Param::Damping),
        pulse_position: p.get(Param::PulsePosition),
        pulse_width: p.get(Param::PulseWidth),
        decay: p.get(Param::Decay),
        bandpass_q: p.get(Param::BandpassQ),
        cutoff_map: CutoffMap::from_index(p.get_int(Param::CutoffMap)),
        random_amount: p.get(Param::RandomAmount),
    }
}

#[inline]
fn mono_input(inputs: &[&[f32]], index: usize) -> f32 {
    if inputs.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0;
    for channel in inputs {
        sum += channel.get(index).copied().unwrap_or(0.0);
    }
    sum / inputs.len() as f32
}

/// Engine running the variant chosen for this CPU.
///
/// The variant never changes after construction.
#[derive(Debug)]
pub enum Engine {
    /// 16-lane core
    Wide16(Box<DspCore<16>>),
    /// 8-lane core
    Wide8(Box<DspCore<8>>),
    /// 4-lane core
    Wide4(Box<DspCore<4>>),
    /// 1-lane core
    Scalar(Box<DspCore<1>>),
}

macro_rules! with_core {
    ($engine:expr, $core:ident => $body:expr) => {
        match $engine {
            Engine::Wide16($core) => $body,
            Engine::Wide8($core) => $body,
            Engine::Wide4($core) => $body,
            Engine::Scalar($core) => $body,
        }
    };
}

impl Engine {
    /// Probe the CPU and build the first supported candidate.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnsupportedCpu`] if no candidate can run here,
    /// [`EngineError::InvalidSampleRate`] for a bad initial rate.
    pub fn new(options: EngineOptions) -> Result<Self, EngineError> {
        Self::with_cpu(&options, &CpuFeatures::detect())
    }

    /// Build against an explicit feature set.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_cpu(options: &EngineOptions, cpu: &CpuFeatures) -> Result<Self, EngineError> {
        validate_sample_rate(options.sample_rate)?;
        let variant = select_variant(&options.candidates, cpu)?;
        info!(
            variant = variant.name(),
            lanes = variant.lanes(),
            sample_rate = options.sample_rate,
            "engine variant selected"
        );
        Ok(Self::build(variant, options.sample_rate))
    }

    /// Build a specific variant without probing the CPU.
    ///
    /// All variants compute the same result, so this is safe on any CPU.
    pub fn build(variant: EngineVariant, sample_rate: f32) -> Self {
        match variant {
            EngineVariant::Wide16 => Self::Wide16(Box::new(DspCore::new(sample_rate))),
            EngineVariant::Wide8 => Self::Wide8(Box::new(DspCore::new(sample_rate))),
            EngineVariant::Wide4 => Self::Wide4(Box::new(DspCore::new(sample_rate))),
            EngineVariant::Scalar => Self::Scalar(Box::new(DspCore::new(sample_rate))),
        }
    }

    /// Variant this engine runs.
    pub fn variant(&self) -> EngineVariant {
        match self {
            Self::Wide16(_) => EngineVariant::Wide16,
            Self::Wide8(_) => EngineVariant::Wide8,
            Self::Wide4(_) => EngineVariant::Wide4,
            Self::Scalar(_) => EngineVariant::Scalar,
        }
    }

    /// See [`DspCore::setup`].
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidSampleRate`] for a non-finite or non-positive
    /// rate.
    pub fn setup(&mut self, sample_rate: f32) -> Result<(), EngineError> {
        with_core!(self, core => core.setup(sample_rate))
    }

    /// See [`DspCore::reset`].
    pub fn reset(&mut self) {
        with_core!(self, core => core.reset());
    }

    /// See [`DspCore::startup`].
    pub fn startup(&mut self) {
        with_core!(self, core => core.startup());
    }

    /// See [`DspCore::update_parameters`].
    pub fn update_parameters(&mut self, updates: &[ParamUpdate]) {
        with_core!(self, core => core.update_parameters(updates));
    }

    /// See [`DspCore::set_parameters`].
    pub fn set_parameters(&mut self, tempo: Option<f64>) {
        with_core!(self, core => core.set_parameters(tempo));
    }

    /// See [`DspCore::push_midi_note`].
    pub fn push_midi_note(
        &mut self,
        is_note_on: bool,
        sample_offset: u32,
        note_id: i32,
        pitch: i16,
        tuning: f32,
        velocity: f32,
    ) -> bool {
        with_core!(self, core => core.push_midi_note(
            is_note_on,
            sample_offset,
            note_id,
            pitch,
            tuning,
            velocity,
        ))
    }

    /// See [`DspCore::process`].
    pub fn process(&mut self, inputs: &[&[f32]], outputs: &mut [&mut [f32]]) {
        with_core!(self, core => core.process(inputs, outputs));
    }

    /// See [`DspCore::encode_state`].
    pub fn encode_state(&self) -> Vec<u8> {
        with_core!(self, core => core.encode_state())
    }

    /// See [`DspCore::decode_state`].
    pub fn decode_state(&mut self, bytes: &[u8]) -> DecodeSummary {
        with_core!(self, core => core.decode_state(bytes))
    }

    /// The parameter store.
    pub fn params(&self) -> &ParameterStore {
        with_core!(self, core => core.params())
    }

    /// Mutable parameter store, for control-thread setup.
    pub fn params_mut(&mut self) -> &mut ParameterStore {
        with_core!(self, core => core.params_mut())
    }

    /// Held notes.
    pub fn notes(&self) -> &NoteStack {
        with_core!(self, core => core.notes())
    }

    /// Handle for out-of-band table rebuilds.
    pub fn table_commands(&self) -> TableCommands {
        with_core!(self, core => core.table_commands())
    }

    /// Current sample rate.
    pub fn sample_rate(&self) -> f32 {
        with_core!(self, core => core.sample_rate())
    }

    /// Bypass state.
    pub fn crossfade_state(&self) -> CrossfadeState {
        with_core!(self, core => core.crossfade_state())
    }

    /// Pitch the smoother is heading to.
    pub fn pitch_target(&self) -> f32 {
        with_core!(self, core => core.pitch_target())
    }

    /// Note events dropped because the queue was full.
    pub fn dropped_events(&self) -> u64 {
        with_core!(self, core => core.dropped_events())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cymbalum_core::midi_to_frequency;

    const SR: f32 = 48000.0;

    fn render<const L: usize>(core: &mut DspCore<L>, len: usize) -> Vec<f32> {
        let mut out = vec![0.0; len];
        core.process(&[], &mut [out.as_mut_slice()]);
        out
    }

    #[test]
    fn rejects_bad_sample_rates() {
        let mut core = DspCore::<4>::new(SR);
        for sr in [0.0, -44100.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                core.setup(sr),
                Err(EngineError::InvalidSampleRate(_))
            ));
        }
        assert_eq!(core.sample_rate(), SR);
        assert!(core.setup(96000.0).is_ok());
        assert_eq!(core.sample_rate(), 96000.0);
    }

    #[test]
    fn silent_without_notes() {
        let mut core = DspCore::<4>::new(SR);
        core.set_parameters(None);
        assert!(render(&mut core, 1024).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn note_starts_at_its_offset() {
        let mut core = DspCore::<4>::new(SR);
        core.set_parameters(None);
        assert!(core.push_midi_note(true, 100, 1, 60, 0.0, 1.0));

        let out = render(&mut core, 2048);
        assert!(
            out[..100].iter().all(|&x| x == 0.0),
            "Should be silent before the note offset"
        );
        assert!(
            out[100..].iter().any(|&x| x != 0.0),
            "Should ring after the note offset"
        );
        assert_eq!(core.notes().len(), 1);
    }

    #[test]
    fn note_on_sets_trigger_for_next_block() {
        let mut core = DspCore::<4>::new(SR);
        core.set_parameters(None);
        core.push_midi_note(true, 0, 1, 60, 0.0, 1.0);
        render(&mut core, 16);
        assert!(core.trigger);
        core.set_parameters(None);
        assert!(!core.trigger);
    }

    /// Three identical notes, one per 16-block period, each started at the
    /// same in-block offset. Returns each note's output from its onset.
    fn repeated_notes<const L: usize>(retrigger: bool) -> Vec<Vec<f32>> {
        const BLOCK: usize = 256;
        const ONSET: usize = 32;

        let mut core = DspCore::<L>::new(SR);
        core.params_mut()
            .set_plain(Param::Retrigger, if retrigger { 1.0 } else { 0.0 });
        core.startup();

        (0..3)
            .map(|k| {
                let id = k + 1;
                let mut window = Vec::with_capacity(16 * BLOCK);
                for block in 0..16 {
                    match block {
                        0 => {
                            core.push_midi_note(true, ONSET as u32, id, 60, 0.0, 0.9);
                        }
                        8 => {
                            core.push_midi_note(false, 0, id, 60, 0.0, 0.0);
                        }
                        _ => {}
                    }
                    core.set_parameters(None);
                    window.extend(render(&mut core, BLOCK));
                }
                window.split_off(ONSET)
            })
            .collect()
    }

    #[test]
    fn retriggered_notes_are_identical() {
        let windows = repeated_notes::<4>(true);
        assert!(windows[1].iter().any(|&x| x != 0.0), "Note should sound");
        let first_diff = windows[1]
            .iter()
            .zip(&windows[2])
            .position(|(a, b)| a.to_bits() != b.to_bits());
        assert_eq!(
            first_diff, None,
            "Should repeat bit for bit with retrigger on, first difference at {first_diff:?}"
        );
    }

    #[test]
    fn free_running_notes_differ() {
        let windows = repeated_notes::<4>(false);
        assert!(
            windows[1] != windows[2],
            "Should draw new randomization per note with retrigger off"
        );
    }

    #[test]
    fn sustain_pulse_stops_on_last_release() {
        let mut core = DspCore::<4>::new(SR);
        core.params_mut().set_plain(Param::OscType, 2.0);
        core.set_parameters(None);
        core.push_midi_note(true, 0, 1, 69, 0.0, 1.0);
        core.push_midi_note(true, 0, 2, 72, 0.0, 1.0);
        render(&mut core, 256);

        core.set_parameters(None);
        render(&mut core, 2048);
        assert!(core.oscillators.pulse().frequency() > 0.0);

        // Releasing one of two notes keeps the pulse running.
        core.push_midi_note(false, 0, 2, 72, 0.0, 0.0);
        core.set_parameters(None);
        render(&mut core, 256);
        assert!(core.oscillators.pulse().frequency() > 0.0);

        core.push_midi_note(false, 0, 1, 69, 0.0, 0.0);
        core.set_parameters(None);
        render(&mut core, 1024);
        let pulse = core.oscillators.pulse();
        assert_eq!(
            (pulse.phase(), pulse.frequency()),
            (0.0, 0.0),
            "Should be quiescent after the last release"
        );
    }

    #[test]
    fn tiny_sample_rate_renders() {
        let mut core = DspCore::<4>::new(SR);
        core.setup(4.0).unwrap();
        core.params_mut().set_plain(Param::LfoDepth, 1.0);
        core.set_parameters(None);
        core.push_midi_note(true, 0, 1, 60, 0.0, 1.0);
        let mut out = render(&mut core, 32);
        core.set_parameters(None);
        out.extend(render(&mut core, 32));
        assert!(
            out.iter().all(|x| x.is_finite()),
            "Should render finite samples at 4 Hz"
        );
    }

    #[test]
    fn pitch_follows_last_held_note() {
        let mut core = DspCore::<4>::new(SR);
        core.update_parameters(&[ParamUpdate::new(Param::OscType, 0.5)]);
        core.set_parameters(None);

        core.push_midi_note(true, 0, 1, 57, 0.0, 1.0);
        core.push_midi_note(true, 4, 2, 69, 0.0, 1.0);
        core.push_midi_note(false, 8, 2, 69, 0.0, 0.0);
        render(&mut core, 32);

        assert_eq!(core.pitch_target(), midi_to_frequency(57, 0.0));
        assert_eq!(core.notes().current().map(|n| n.id), Some(1));
    }

    #[test]
    fn pitch_bend_scales_target() {
        let mut core = DspCore::<4>::new(SR);
        core.params_mut().set_plain(Param::OscType, 2.0);
        core.params_mut().set_plain(Param::PitchBend, 100.0);
        core.push_midi_note(true, 0, 1, 69, 0.0, 1.0);
        render(&mut core, 1);
        core.set_parameters(None);
        let expected = 440.0 * cents_to_ratio(100.0);
        assert!((core.pitch_target() - expected).abs() < 1e-3);
    }

    #[test]
    fn unknown_note_off_is_ignored() {
        let mut core = DspCore::<4>::new(SR);
        core.set_parameters(None);
        core.push_midi_note(true, 0, 5, 60, 0.0, 0.8);
        core.push_midi_note(false, 1, 99, 61, 0.0, 0.0);
        render(&mut core, 8);
        assert_eq!(core.notes().len(), 1);
    }

    #[test]
    fn events_past_block_apply_at_end() {
        let mut core = DspCore::<4>::new(SR);
        core.set_parameters(None);
        core.push_midi_note(true, 5000, 1, 60, 0.0, 1.0);
        render(&mut core, 64);
        assert_eq!(core.notes().len(), 1);
    }

    #[test]
    fn zero_length_block_still_applies_events() {
        let mut core = DspCore::<4>::new(SR);
        core.push_midi_note(true, 0, 1, 60, 0.0, 1.0);
        render(&mut core, 0);
        assert_eq!(core.notes().len(), 1);
    }

    #[test]
    fn bypass_fades_then_silences() {
        let mut core = DspCore::<4>::new(SR);
        core.set_parameters(None);
        core.push_midi_note(true, 0, 1, 60, 0.0, 1.0);
        render(&mut core, 256);

        core.params_mut().set_plain(Param::Bypass, 1.0);
        core.set_parameters(None);
        assert_eq!(core.crossfade_state(), CrossfadeState::FadingOut);

        let fade = 1920;
        render(&mut core, fade);
        assert_eq!(core.crossfade_state(), CrossfadeState::Bypassed);

        core.set_parameters(None);
        core.push_midi_note(true, 3, 2, 64, 0.0, 1.0);
        let out = render(&mut core, 512);
        assert!(out.iter().all(|&x| x == 0.0));
        assert_eq!(core.notes().len(), 2, "Events still apply while bypassed");

        core.params_mut().set_plain(Param::Bypass, 0.0);
        core.set_parameters(None);
        assert_eq!(core.crossfade_state(), CrossfadeState::FadingIn);
        render(&mut core, fade);
        assert_eq!(core.crossfade_state(), CrossfadeState::Active);
    }

    #[test]
    fn channels_get_the_mono_result() {
        let mut core = DspCore::<8>::new(SR);
        core.set_parameters(None);
        core.push_midi_note(true, 0, 1, 60, 0.0, 1.0);
        let mut left = vec![0.0; 128];
        let mut right = vec![1.0; 128];
        let mut short = vec![1.0; 200];
        core.process(
            &[],
            &mut [left.as_mut_slice(), right.as_mut_slice(), short.as_mut_slice()],
        );
        assert_eq!(left, right);
        assert_eq!(&short[..128], &left[..]);
        assert!(short[128..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn effect_role_excites_from_input() {
        let mut core = DspCore::<4>::new(SR);
        core.params_mut().set_plain(Param::OscType, 0.0);
        core.set_parameters(None);

        let mut input = vec![0.0; 1024];
        input[0] = 1.0;
        let mut out = vec![0.0; 1024];
        core.process(&[&input[..], &input[..]], &mut [out.as_mut_slice()]);
        assert!(out.iter().any(|&x| x != 0.0), "Input should excite the body");
    }

    #[test]
    fn state_round_trips_through_core() {
        let mut a = DspCore::<4>::new(SR);
        a.params_mut().set_plain(Param::Units, 12.0);
        a.params_mut().set_plain(Param::Decay, 5.0);

        let mut b = DspCore::<4>::new(SR);
        let summary = b.decode_state(&a.encode_state());
        assert!(summary.is_exact());
        assert_eq!(b.params(), a.params());
    }

    #[test]
    fn dispatch_reports_variant() {
        for variant in EngineVariant::ALL {
            assert_eq!(Engine::build(variant, SR).variant(), variant);
        }
    }

    #[test]
    fn unsupported_cpu_is_an_error() {
        let options = EngineOptions {
            candidates: vec![EngineVariant::Wide16, EngineVariant::Wide8],
            ..EngineOptions::default()
        };
        assert!(matches!(
            Engine::with_cpu(&options, &CpuFeatures::none()),
            Err(EngineError::UnsupportedCpu)
        ));
    }

    #[test]
    fn bad_initial_rate_is_an_error() {
        let options = EngineOptions {
            sample_rate: 0.0,
            ..EngineOptions::default()
        };
        assert!(matches!(
            Engine::new(options),
            Err(EngineError::InvalidSampleRate(_))
        ));
    }
}
