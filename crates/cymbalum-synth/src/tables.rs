//! Out-of-band lookup tables and the tempo-synced LFO that reads them.
//!
//! Table rebuilds are too slow for the audio callback. The control thread
//! asks for one by name through [`TableCommands::request`], then runs the
//! work with [`TableCommands::run_pending`]. The result is published through
//! an `ArcSwap`, so the audio thread picks it up with a wait-free load at the
//! next block and never allocates or frees a table.
//!
//! # Thread Safety
//!
//! - **Table**: `ArcSwap::load()`, wait-free on the audio thread.
//! - **Pending flag**: `AtomicBool`, set by `request`, cleared by `run_pending`.
//! - **Retired tables**: `Mutex`, control thread only. Replaced tables are
//!   kept here until the control thread holds the last reference, so the
//!   audio thread never drops one. Any number of rebuilds may land inside a
//!   single audio block.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use arc_swap::{ArcSwap, Guard};
use core::f32::consts::TAU;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::EngineError;
use crate::params::{Param, ParameterStore};

/// Points in the LFO table.
pub const LFO_TABLE_SIZE: usize = 1024;

/// Tempo assumed until the host reports one.
pub const DEFAULT_TEMPO: f64 = 120.0;

/// Name accepted by [`TableCommands::request`] for the LFO table.
pub const LFO_COMMAND: &str = "lfo";

/// One cycle of the LFO waveform.
///
/// `shape` morphs sine (0) through triangle (0.5) to square (1).
#[derive(Debug, Clone, PartialEq)]
pub struct LfoTable {
    shape: f32,
    samples: [f32; LFO_TABLE_SIZE],
}

impl LfoTable {
    /// Build the table for `shape` in `[0, 1]`.
    pub fn new(shape: f32) -> Self {
        let shape = if shape.is_finite() {
            shape.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let samples = core::array::from_fn(|i| {
            let phase = i as f32 / LFO_TABLE_SIZE as f32;
            let sine = libm::sinf(TAU * phase);
            let triangle = triangle(phase);
            if shape < 0.5 {
                let t = shape * 2.0;
                sine * (1.0 - t) + triangle * t
            } else {
                let square = if phase < 0.5 { 1.0 } else { -1.0 };
                let t = shape * 2.0 - 1.0;
                triangle * (1.0 - t) + square * t
            }
        });
        Self { shape, samples }
    }

    /// Shape this table was built for.
    pub fn shape(&self) -> f32 {
        self.shape
    }

    /// Linearly interpolated value at `phase` in `[0, 1)`.
    #[inline]
    pub fn read(&self, phase: f32) -> f32 {
        let pos = (phase - libm::floorf(phase)) * LFO_TABLE_SIZE as f32;
        let index = (pos as usize).min(LFO_TABLE_SIZE - 1);
        let frac = pos - index as f32;
        let a = self.samples[index];
        let b = self.samples[(index + 1) % LFO_TABLE_SIZE];
        a + (b - a) * frac
    }
}

impl Default for LfoTable {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Triangle with the same phase as a sine: 0 → 1 → 0 → -1 → 0.
fn triangle(phase: f32) -> f32 {
    if phase < 0.25 {
        phase * 4.0
    } else if phase < 0.75 {
        2.0 - phase * 4.0
    } else {
        phase * 4.0 - 4.0
    }
}

/// LFO whose period is a number of beats at the host tempo.
#[derive(Debug, Clone)]
pub struct TempoLfo {
    phase: f32,
    tempo: f64,
    beats: f32,
    sample_rate: f32,
}

impl TempoLfo {
    /// New LFO at `sample_rate`, 120 BPM, four beats.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            tempo: DEFAULT_TEMPO,
            beats: 4.0,
            sample_rate,
        }
    }

    /// Update the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Host tempo in BPM. `None` keeps the last known tempo.
    pub fn set_tempo(&mut self, tempo: Option<f64>) {
        if let Some(bpm) = tempo.filter(|t| t.is_finite() && *t > 0.0) {
            self.tempo = bpm;
        }
    }

    /// Period in beats.
    pub fn set_beats(&mut self, beats: f32) {
        self.beats = beats.max(1e-3);
    }

    /// Current tempo in BPM.
    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    /// Current phase in `[0, 1)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Restart the cycle.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Read `table` at the current phase, then advance one sample.
    #[inline]
    pub fn process(&mut self, table: &LfoTable) -> f32 {
        let value = table.read(self.phase);
        let hz = (self.tempo / 60.0) as f32 / self.beats;
        self.phase += hz / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= libm::floorf(self.phase);
        }
        value
    }
}

struct TableShared {
    lfo: ArcSwap<LfoTable>,
    retired: Mutex<Vec<Arc<LfoTable>>>,
    lfo_pending: AtomicBool,
    generation: AtomicU64,
}

/// Control-thread handle for table rebuilds.
///
/// Cheap to clone; every clone refers to the same tables.
#[derive(Clone)]
pub struct TableCommands {
    inner: Arc<TableShared>,
}

impl TableCommands {
    /// Handle holding the default tables.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TableShared {
                lfo: ArcSwap::from_pointee(LfoTable::default()),
                retired: Mutex::new(Vec::new()),
                lfo_pending: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Queue a rebuild by name.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownCommand`] for any name other than `"lfo"`.
    pub fn request(&self, name: &str) -> Result<(), EngineError> {
        match name {
            LFO_COMMAND => {
                self.inner.lfo_pending.store(true, Ordering::Release);
                Ok(())
            }
            other => Err(EngineError::UnknownCommand(other.to_string())),
        }
    }

    /// Whether a rebuild is queued.
    pub fn has_pending(&self) -> bool {
        self.inner.lfo_pending.load(Ordering::Acquire)
    }

    /// Run queued rebuilds against `params`. Returns how many ran.
    ///
    /// Also frees retired tables the audio thread has let go of.
    pub fn run_pending(&self, params: &ParameterStore) -> usize {
        Self::release_unused(&mut self.inner.retired.lock());
        if !self.inner.lfo_pending.swap(false, Ordering::AcqRel) {
            return 0;
        }
        self.rebuild_lfo(params.get(Param::LfoShape));
        1
    }

    /// Build and publish a new LFO table.
    pub fn rebuild_lfo(&self, shape: f32) {
        let previous = self.inner.lfo.swap(Arc::new(LfoTable::new(shape)));
        let mut retired = self.inner.retired.lock();
        retired.push(previous);
        Self::release_unused(&mut retired);
        drop(retired);
        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(shape, generation, "LFO table rebuilt");
    }

    /// Number of replaced tables still awaiting release.
    pub fn retired_count(&self) -> usize {
        self.inner.retired.lock().len()
    }

    // A retired table whose only owner is the list can be dropped here, on
    // the control thread.
    fn release_unused(retired: &mut Vec<Arc<LfoTable>>) {
        retired.retain(|table| Arc::strong_count(table) > 1);
    }

    /// Current LFO table. Wait-free.
    #[inline]
    pub fn load_lfo(&self) -> Guard<Arc<LfoTable>> {
        self.inner.lfo.load()
    }

    /// Number of tables published since construction.
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }
}

impl Default for TableCommands {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for TableCommands {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TableCommands")
            .field("generation", &self.generation())
            .field("pending", &self.has_pending())
            .finish_non_exhaustive()
    }
}
