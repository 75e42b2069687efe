//! Parameter table and the normalized parameter store.
//!
//! Every host-visible parameter has a dense, stable id. The id is the index
//! into [`PARAMETERS`], the slot in [`ParameterStore`], and the position of
//! its value in the persisted state.
//!
//! # State Format
//!
//! [`ParameterStore::encode_state`] writes one little-endian `f64` per id,
//! in id order, holding the normalized value. There is no header and no
//! version: decoding fills missing ids with defaults and ignores anything
//! past the last known id.
//!
//! ```rust
//! use cymbalum_synth::{Param, ParameterStore};
//!
//! let mut store = ParameterStore::new();
//! store.set_from_normalized(Param::Decay, 0.25);
//!
//! let bytes = store.encode_state();
//! let (restored, summary) = ParameterStore::decode_state(&bytes);
//! assert_eq!(restored, store);
//! assert_eq!(summary.defaulted, 0);
//! ```

use cymbalum_core::{ParamDescriptor, ParamId, ParamScale, ParamUnit};

/// Number of parameters.
pub const PARAM_COUNT: usize = 26;

/// Bytes per persisted value.
const VALUE_BYTES: usize = core::mem::size_of::<f64>();

/// Named parameter ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Param {
    /// Click-free bypass toggle
    Bypass = 0,
    /// Random seed restored at transport start and retrigger
    Seed = 1,
    /// Reseed on every note-on
    Retrigger = 2,
    /// Excitation comb on/off
    Excitation = 3,
    /// Collision coupling between adjacent body units
    Collision = 4,
    /// Oscillator mode, see [`OscillatorMode`](crate::OscillatorMode)
    OscType = 5,
    /// Smoothing time for gain and pitch, seconds
    Smoothness = 6,
    /// Master gain
    Gain = 7,
    /// Pitch bend in cents
    PitchBend = 8,
    /// Excitation comb delay time, seconds
    CombTime = 9,
    /// Excitation comb feedback
    CombFeedback = 10,
    /// Per-trigger randomization amount
    RandomAmount = 11,
    /// Number of body units
    Units = 12,
    /// Bandpass sections per unit
    Stack = 13,
    /// Lowest unit frequency
    MinFrequency = 14,
    /// Highest unit frequency
    MaxFrequency = 15,
    /// Collision threshold
    Distance = 16,
    /// String loop damping
    Damping = 17,
    /// Pickup position along the string
    PulsePosition = 18,
    /// Excitation smoothing relative to the string period
    PulseWidth = 19,
    /// Time to decay by 60 dB, seconds
    Decay = 20,
    /// Body bandpass Q
    BandpassQ = 21,
    /// Unit frequency distribution, see [`CutoffMap`](crate::CutoffMap)
    CutoffMap = 22,
    /// LFO period in beats
    LfoBeats = 23,
    /// LFO modulation depth on the comb time
    LfoDepth = 24,
    /// LFO waveform morph
    LfoShape = 25,
}

impl Param {
    /// All parameters in id order.
    pub const ALL: [Param; PARAM_COUNT] = [
        Param::Bypass,
        Param::Seed,
        Param::Retrigger,
        Param::Excitation,
        Param::Collision,
        Param::OscType,
        Param::Smoothness,
        Param::Gain,
        Param::PitchBend,
        Param::CombTime,
        Param::CombFeedback,
        Param::RandomAmount,
        Param::Units,
        Param::Stack,
        Param::MinFrequency,
        Param::MaxFrequency,
        Param::Distance,
        Param::Damping,
        Param::PulsePosition,
        Param::PulseWidth,
        Param::Decay,
        Param::BandpassQ,
        Param::CutoffMap,
        Param::LfoBeats,
        Param::LfoDepth,
        Param::LfoShape,
    ];

    /// Stable id.
    pub const fn id(self) -> ParamId {
        ParamId(self as u32)
    }

    /// Descriptor from [`PARAMETERS`].
    pub fn descriptor(self) -> &'static ParamDescriptor {
        &PARAMETERS[self as usize]
    }
}

impl From<Param> for ParamId {
    fn from(p: Param) -> Self {
        p.id()
    }
}

const fn seconds(
    name: &'static str,
    short: &'static str,
    min: f32,
    max: f32,
    default: f32,
) -> ParamDescriptor {
    ParamDescriptor::continuous(name, short, ParamUnit::Seconds, min, max, default)
}

const fn hertz(
    name: &'static str,
    short: &'static str,
    min: f32,
    max: f32,
    default: f32,
) -> ParamDescriptor {
    ParamDescriptor::continuous(name, short, ParamUnit::Hertz, min, max, default)
        .with_scale(ParamScale::Logarithmic)
}

const fn plain(
    name: &'static str,
    short: &'static str,
    min: f32,
    max: f32,
    default: f32,
) -> ParamDescriptor {
    ParamDescriptor::continuous(name, short, ParamUnit::None, min, max, default)
}

/// The parameter table, indexed by id.
pub static PARAMETERS: [ParamDescriptor; PARAM_COUNT] = [
    ParamDescriptor::toggle("Bypass", "Bypass", false).with_id(ParamId(0), "bypass"),
    ParamDescriptor::stepped("Seed", "Seed", 0.0, 65535.0, 0.0)
        .with_id(ParamId(1), "seed")
        .with_group("random"),
    ParamDescriptor::toggle("Retrigger", "Retrig", true)
        .with_id(ParamId(2), "retrigger")
        .with_group("random"),
    ParamDescriptor::toggle("Excitation", "Excite", true)
        .with_id(ParamId(3), "excitation")
        .with_group("excitation"),
    ParamDescriptor::toggle("Collision", "Collide", true)
        .with_id(ParamId(4), "collision")
        .with_group("body"),
    ParamDescriptor::stepped("Oscillator", "Osc", 0.0, 4.0, 1.0)
        .with_id(ParamId(5), "osc_type")
        .with_group("oscillator"),
    seconds("Smoothness", "Smooth", 0.0, 0.5, 0.02)
        .with_id(ParamId(6), "smoothness")
        .with_scale(ParamScale::Power(3.0)),
    plain("Gain", "Gain", 0.0, 2.0, 0.5)
        .with_id(ParamId(7), "gain")
        .with_scale(ParamScale::Power(2.0)),
    ParamDescriptor::continuous("Pitch Bend", "Bend", ParamUnit::Cents, -200.0, 200.0, 0.0)
        .with_id(ParamId(8), "pitch_bend")
        .with_group("oscillator"),
    seconds("Comb Time", "CombT", 0.0001, 0.1, 0.002)
        .with_id(ParamId(9), "comb_time")
        .with_scale(ParamScale::Logarithmic)
        .with_group("excitation"),
    plain("Comb Feedback", "CombFB", 0.0, 0.9999, 0.3)
        .with_id(ParamId(10), "comb_feedback")
        .with_group("excitation"),
    plain("Random Amount", "Random", 0.0, 1.0, 0.1)
        .with_id(ParamId(11), "random_amount")
        .with_group("random"),
    ParamDescriptor::stepped("Units", "Units", 1.0, 32.0, 4.0)
        .with_id(ParamId(12), "units")
        .with_group("body"),
    ParamDescriptor::stepped("Stack", "Stack", 1.0, 8.0, 2.0)
        .with_id(ParamId(13), "stack")
        .with_group("body"),
    hertz("Min Frequency", "MinFreq", 20.0, 8000.0, 80.0)
        .with_id(ParamId(14), "min_frequency")
        .with_group("body"),
    hertz("Max Frequency", "MaxFreq", 20.0, 16000.0, 4000.0)
        .with_id(ParamId(15), "max_frequency")
        .with_group("body"),
    plain("Distance", "Dist", 0.0, 1.0, 0.15)
        .with_id(ParamId(16), "distance")
        .with_group("body"),
    plain("Damping", "Damp", 0.0, 0.99, 0.5)
        .with_id(ParamId(17), "damping")
        .with_group("body"),
    plain("Pulse Position", "PulsePos", 0.01, 1.0, 0.3)
        .with_id(ParamId(18), "pulse_position")
        .with_group("body"),
    plain("Pulse Width", "PulseW", 0.0, 1.0, 0.2)
        .with_id(ParamId(19), "pulse_width")
        .with_group("body"),
    seconds("Decay", "Decay", 0.01, 16.0, 2.0)
        .with_id(ParamId(20), "decay")
        .with_scale(ParamScale::Logarithmic)
        .with_group("body"),
    plain("Bandpass Q", "BP Q", 0.1, 50.0, 2.0)
        .with_id(ParamId(21), "bandpass_q")
        .with_scale(ParamScale::Logarithmic)
        .with_group("body"),
    ParamDescriptor::stepped("Cutoff Map", "CutMap", 0.0, 2.0, 1.0)
        .with_id(ParamId(22), "cutoff_map")
        .with_group("body"),
    ParamDescriptor::continuous("LFO Beats", "LfoBeat", ParamUnit::Beats, 0.25, 16.0, 4.0)
        .with_id(ParamId(23), "lfo_beats")
        .with_scale(ParamScale::Logarithmic)
        .with_group("lfo"),
    plain("LFO Depth", "LfoDep", 0.0, 1.0, 0.0)
        .with_id(ParamId(24), "lfo_depth")
        .with_group("lfo"),
    plain("LFO Shape", "LfoShp", 0.0, 1.0, 0.0)
        .with_id(ParamId(25), "lfo_shape")
        .with_group("lfo"),
];

/// One normalized update from the host, applied at the next block boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamUpdate {
    /// Target parameter
    pub id: ParamId,
    /// Normalized value in `[0, 1]`
    pub value: f64,
}

impl ParamUpdate {
    /// Create an update.
    pub fn new(id: impl Into<ParamId>, value: f64) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

/// What [`ParameterStore::decode_state`] found in a state blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeSummary {
    /// Values taken from the blob.
    pub read: usize,
    /// Ids that fell back to their default (missing or non-finite).
    pub defaulted: usize,
    /// Trailing bytes that were not used.
    pub ignored_bytes: usize,
}

impl DecodeSummary {
    /// Whether every id was restored and nothing was left over.
    pub fn is_exact(&self) -> bool {
        self.defaulted == 0 && self.ignored_bytes == 0
    }
}

/// Fixed-size, id-ordered array of normalized values.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterStore {
    values: [f64; PARAM_COUNT],
}

impl ParameterStore {
    /// Store holding every default.
    pub fn new() -> Self {
        Self {
            values: core::array::from_fn(|i| PARAMETERS[i].default_normalized()),
        }
    }

    /// The parameter table.
    pub fn descriptors() -> &'static [ParamDescriptor] {
        &PARAMETERS
    }

    /// Descriptor for `id`, if it exists.
    pub fn descriptor(id: impl Into<ParamId>) -> Option<&'static ParamDescriptor> {
        PARAMETERS.get(id.into().index())
    }

    /// Look up an id by its string id (`"decay"`, `"osc_type"`, ...).
    pub fn find(string_id: &str) -> Option<ParamId> {
        PARAMETERS
            .iter()
            .find(|d| d.string_id == string_id)
            .map(|d| d.id)
    }

    /// Real value of `id`, or `0.0` for an unknown id.
    ///
    /// Stepped parameters come back as exact integers.
    pub fn get(&self, id: impl Into<ParamId>) -> f32 {
        let index = id.into().index();
        match (PARAMETERS.get(index), self.values.get(index)) {
            (Some(desc), Some(&n)) => {
                let value = desc.clamp(desc.denormalize(n as f32));
                if desc.is_stepped() {
                    value.round()
                } else {
                    value
                }
            }
            _ => 0.0,
        }
    }

    /// Stepped value as an integer.
    pub fn get_int(&self, id: impl Into<ParamId>) -> u32 {
        self.get(id).max(0.0) as u32
    }

    /// Toggle value.
    pub fn get_bool(&self, id: impl Into<ParamId>) -> bool {
        self.get(id) >= 0.5
    }

    /// Normalized value of `id`.
    pub fn normalized(&self, id: impl Into<ParamId>) -> Option<f64> {
        self.values.get(id.into().index()).copied()
    }

    /// Write a normalized value.
    ///
    /// Unknown ids and non-finite values are ignored. The value is clamped to
    /// `[0, 1]` and stepped parameters snap to their grid.
    pub fn set_from_normalized(&mut self, id: impl Into<ParamId>, value: f64) {
        let index = id.into().index();
        if !value.is_finite() {
            return;
        }
        if let (Some(desc), Some(slot)) = (PARAMETERS.get(index), self.values.get_mut(index)) {
            *slot = desc.snap_normalized(value.clamp(0.0, 1.0));
        }
    }

    /// Write a real value, clamped to the parameter's range.
    pub fn set_plain(&mut self, id: impl Into<ParamId>, value: f32) {
        let id = id.into();
        if let Some(desc) = PARAMETERS.get(id.index()) {
            let n = desc.normalize(desc.clamp(value));
            self.set_from_normalized(id, f64::from(n));
        }
    }

    /// Apply a batch of host updates in order.
    pub fn apply(&mut self, updates: &[ParamUpdate]) {
        for update in updates {
            self.set_from_normalized(update.id, update.value);
        }
    }

    /// Restore every default.
    pub fn reset_to_defaults(&mut self) {
        *self = Self::new();
    }

    /// Serialize as id-ordered little-endian `f64` normalized values.
    pub fn encode_state(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(PARAM_COUNT * VALUE_BYTES);
        for value in &self.values {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Decode a state blob into a fresh store.
    ///
    /// Never fails: see [`decode_into`](Self::decode_into).
    pub fn decode_state(bytes: &[u8]) -> (Self, DecodeSummary) {
        let mut store = Self::new();
        let summary = store.decode_into(bytes);
        (store, summary)
    }

    /// Overwrite this store from a state blob.
    ///
    /// Missing ids and non-finite values take their defaults. Values outside
    /// `[0, 1]` are clamped. A trailing partial value and any bytes past the
    /// last id are ignored.
    pub fn decode_into(&mut self, bytes: &[u8]) -> DecodeSummary {
        let mut summary = DecodeSummary::default();
        let mut chunks = bytes.chunks_exact(VALUE_BYTES);

        for (index, desc) in PARAMETERS.iter().enumerate() {
            let decoded = chunks
                .next()
                .and_then(|chunk| <[u8; VALUE_BYTES]>::try_from(chunk).ok())
                .map(f64::from_le_bytes)
                .filter(|v| v.is_finite());

            match decoded {
                Some(value) => {
                    self.values[index] = desc.snap_normalized(value.clamp(0.0, 1.0));
                    summary.read += 1;
                }
                None => {
                    self.values[index] = desc.default_normalized();
                    summary.defaulted += 1;
                }
            }
        }

        let used = (bytes.len() / VALUE_BYTES).min(PARAM_COUNT) * VALUE_BYTES;
        summary.ignored_bytes = bytes.len() - used;
        summary
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
