//! Parameter metadata for host-visible engine parameters.
//!
//! A plugin host talks to the engine exclusively in normalized `[0, 1]`
//! values. [`ParamDescriptor`] carries everything needed to translate those
//! into real values: range, default, curve ([`ParamScale`]), step grid and
//! capability flags ([`ParamFlags`]).
//!
//! Descriptors are `const`-constructible so a whole parameter table can live
//! in a `static` with no initialization at runtime.
//!
//! # Example
//!
//! ```rust
//! use cymbalum_core::{ParamDescriptor, ParamId, ParamScale, ParamUnit};
//!
//! const DECAY: ParamDescriptor =
//!     ParamDescriptor::continuous("Decay", "Decay", ParamUnit::Seconds, 0.01, 16.0, 2.0)
//!         .with_id(ParamId(20), "decay")
//!         .with_scale(ParamScale::Logarithmic);
//!
//! let n = DECAY.normalize(2.0);
//! assert!((DECAY.denormalize(n) - 2.0).abs() < 1e-4);
//! ```
//!
//! # no_std Support
//!
//! This module is fully `no_std` compatible with no heap allocations required.

/// Scaling curve for parameter normalization.
///
/// # Normalization Formulas
///
/// - **Linear**: `normalized = (value - min) / (max - min)`
/// - **Logarithmic**: `normalized = ln(value/min) / ln(max/min)`
/// - **Power(exp)**: `normalized = ((value - min) / (max - min)).powf(1.0 / exp)`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamScale {
    /// Linear mapping (default).
    #[default]
    Linear,
    /// Logarithmic mapping. More resolution at low values.
    /// Requires `min > 0.0`.
    Logarithmic,
    /// Power curve mapping with configurable exponent.
    /// exponent > 1.0 → more resolution at the low end of the plain range.
    Power(f32),
}

/// Stable parameter identifier.
///
/// Ids are dense: the id doubles as the index into the parameter table and
/// the slot in the persisted state. Once assigned it must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub u32);

impl ParamId {
    /// Table index for this id.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Parameter capability flags.
///
/// # Example
///
/// ```rust
/// use cymbalum_core::ParamFlags;
///
/// let flags = ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED);
/// assert!(flags.contains(ParamFlags::STEPPED));
/// assert!(!flags.contains(ParamFlags::HIDDEN));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Host can automate this parameter.
    pub const AUTOMATABLE: Self = Self(1 << 0);
    /// Parameter has discrete steps (toggles, enums, counts).
    pub const STEPPED: Self = Self(1 << 1);
    /// Parameter should be hidden from generic host UI.
    pub const HIDDEN: Self = Self(1 << 2);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for ParamFlags {
    fn default() -> Self {
        Self::AUTOMATABLE
    }
}

/// Describes a single parameter's metadata.
///
/// The `step` field is only meaningful for [`ParamFlags::STEPPED`]
/// parameters, where it defines the grid [`snap_normalized`](Self::snap_normalized)
/// rounds to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Full parameter name for display.
    pub name: &'static str,
    /// Short name, max 8 characters.
    pub short_name: &'static str,
    /// Unit type for formatting the parameter value.
    pub unit: ParamUnit,
    /// Minimum plain value.
    pub min: f32,
    /// Maximum plain value.
    pub max: f32,
    /// Default plain value.
    pub default: f32,
    /// Step size of the plain value grid.
    pub step: f32,
    /// Stable numeric ID.
    pub id: ParamId,
    /// Human-readable stable ID used by config files and the CLI.
    pub string_id: &'static str,
    /// Normalization curve.
    pub scale: ParamScale,
    /// Capability flags.
    pub flags: ParamFlags,
    /// Parameter group for display (`"body"`, `"excitation"`, ...).
    pub group: &'static str,
}

impl ParamDescriptor {
    /// Continuous parameter with a custom unit and range.
    ///
    /// # Arguments
    ///
    /// * `name` - Full parameter name
    /// * `short_name` - Short name for narrow displays
    /// * `unit` - Display unit
    /// * `min` - Minimum plain value
    /// * `max` - Maximum plain value
    /// * `default` - Default plain value
    pub const fn continuous(
        name: &'static str,
        short_name: &'static str,
        unit: ParamUnit,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit,
            min,
            max,
            default,
            step: 0.0,
            id: ParamId(0),
            string_id: "",
            scale: ParamScale::Linear,
            flags: ParamFlags::AUTOMATABLE,
            group: "",
        }
    }

    /// Integer-stepped parameter (counts, enum selectors).
    pub const fn stepped(
        name: &'static str,
        short_name: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            name,
            short_name,
            unit: ParamUnit::None,
            min,
            max,
            default,
            step: 1.0,
            id: ParamId(0),
            string_id: "",
            scale: ParamScale::Linear,
            flags: ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED),
            group: "",
        }
    }

    /// On/off switch.
    pub const fn toggle(name: &'static str, short_name: &'static str, default: bool) -> Self {
        Self::stepped(name, short_name, 0.0, 1.0, if default { 1.0 } else { 0.0 })
    }

    /// Sets the stable parameter ID and string ID.
    pub const fn with_id(mut self, id: ParamId, string_id: &'static str) -> Self {
        self.id = id;
        self.string_id = string_id;
        self
    }

    /// Sets the normalization scale.
    pub const fn with_scale(mut self, scale: ParamScale) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the parameter flags.
    pub const fn with_flags(mut self, flags: ParamFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the parameter group.
    pub const fn with_group(mut self, group: &'static str) -> Self {
        self.group = group;
        self
    }

    /// Whether the parameter only takes values on its step grid.
    #[inline]
    pub const fn is_stepped(&self) -> bool {
        self.flags.contains(ParamFlags::STEPPED)
    }

    /// Clamps a value to this parameter's valid range.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cymbalum_core::{ParamDescriptor, ParamUnit};
    ///
    /// let desc = ParamDescriptor::continuous("Gain", "Gain", ParamUnit::None, 0.0, 2.0, 0.5);
    /// assert_eq!(desc.clamp(-1.0), 0.0);
    /// assert_eq!(desc.clamp(3.0), 2.0);
    /// ```
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Converts a plain value to normalized range (0.0 to 1.0).
    #[inline]
    pub fn normalize(&self, value: f32) -> f32 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.0;
        }
        match self.scale {
            ParamScale::Linear => (value - self.min) / range,
            ParamScale::Logarithmic => {
                if self.min <= 0.0 || value <= 0.0 {
                    return 0.0;
                }
                libm::logf(value / self.min) / libm::logf(self.max / self.min)
            }
            ParamScale::Power(exp) => {
                let linear = (value - self.min) / range;
                libm::powf(linear.max(0.0), 1.0 / exp)
            }
        }
    }

    /// Converts a normalized value (0.0 to 1.0) to the plain range.
    ///
    /// Inverse of [`normalize`](Self::normalize).
    #[inline]
    pub fn denormalize(&self, normalized: f32) -> f32 {
        match self.scale {
            ParamScale::Linear => self.min + normalized * (self.max - self.min),
            ParamScale::Logarithmic => {
                if self.min <= 0.0 {
                    return self.min;
                }
                self.min * libm::powf(self.max / self.min, normalized)
            }
            ParamScale::Power(exp) => {
                let curved = libm::powf(normalized, exp);
                self.min + curved * (self.max - self.min)
            }
        }
    }

    /// Normalized position of [`default`](Self::default).
    #[inline]
    pub fn default_normalized(&self) -> f64 {
        self.snap_normalized(f64::from(self.normalize(self.default)))
    }

    /// Rounds a normalized value onto the step grid.
    ///
    /// Continuous parameters and non-linear scales are returned unchanged.
    /// The result for stepped parameters is exactly `k / steps` so it
    /// survives an encode/decode cycle bit for bit.
    pub fn snap_normalized(&self, normalized: f64) -> f64 {
        if !self.is_stepped() || self.step <= 0.0 || self.scale != ParamScale::Linear {
            return normalized;
        }
        let steps = f64::from((self.max - self.min) / self.step);
        if steps <= 0.0 {
            return 0.0;
        }
        libm::round(normalized * steps) / steps
    }

    /// Number of discrete positions, or `None` for continuous parameters.
    pub fn step_count(&self) -> Option<u32> {
        if self.is_stepped() && self.step > 0.0 {
            Some(libm::roundf((self.max - self.min) / self.step) as u32)
        } else {
            None
        }
    }
}

/// Unit type for parameter display and formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Seconds (s).
    Seconds,
    /// Hertz (Hz).
    Hertz,
    /// Cents (ct), hundredths of a semitone.
    Cents,
    /// Beats at the host tempo.
    Beats,
    /// No unit.
    None,
}

impl ParamUnit {
    /// Returns the unit suffix string for display.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cymbalum_core::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Hertz.suffix(), " Hz");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Seconds => " s",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Cents => " ct",
            ParamUnit::Beats => " beats",
            ParamUnit::None => "",
        }
    }
}
