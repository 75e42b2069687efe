//! Runtime selection of the engine variant.
//!
//! All variants render the same bits; they differ only in how many body units
//! each inner loop covers. [`select_variant`] walks a candidate list, widest
//! first by convention, and returns the first one the host CPU can run.

use core::fmt;

use crate::error::EngineError;

/// Lane width of a DSP core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineVariant {
    /// 16 lanes, AVX-512
    Wide16,
    /// 8 lanes, AVX2 + FMA
    Wide8,
    /// 4 lanes, SSE2 or NEON
    Wide4,
    /// 1 lane, any CPU
    Scalar,
}

impl EngineVariant {
    /// All variants, widest first.
    pub const ALL: [EngineVariant; 4] = [Self::Wide16, Self::Wide8, Self::Wide4, Self::Scalar];

    /// Units per inner loop.
    pub fn lanes(self) -> usize {
        match self {
            Self::Wide16 => 16,
            Self::Wide8 => 8,
            Self::Wide4 => 4,
            Self::Scalar => 1,
        }
    }

    /// Configuration name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Wide16 => "wide16",
            Self::Wide8 => "wide8",
            Self::Wide4 => "wide4",
            Self::Scalar => "scalar",
        }
    }

    /// Look up a variant by configuration name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Whether `cpu` meets this variant's minimum requirement.
    pub fn is_supported(self, cpu: &CpuFeatures) -> bool {
        match self {
            Self::Wide16 => cpu.avx512f,
            Self::Wide8 => cpu.avx2 && cpu.fma,
            Self::Wide4 => cpu.sse2 || cpu.neon,
            Self::Scalar => true,
        }
    }
}

impl fmt::Display for EngineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Instruction set extensions relevant to variant selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct CpuFeatures {
    /// x86 SSE2
    pub sse2: bool,
    /// x86 AVX
    pub avx: bool,
    /// x86 AVX2
    pub avx2: bool,
    /// x86 FMA3
    pub fma: bool,
    /// x86 AVX-512 Foundation
    pub avx512f: bool,
    /// Arm Advanced SIMD
    pub neon: bool,
}

impl CpuFeatures {
    /// Probe the running CPU.
    #[cfg(target_arch = "x86_64")]
    pub fn detect() -> Self {
        Self {
            sse2: std::is_x86_feature_detected!("sse2"),
            avx: std::is_x86_feature_detected!("avx"),
            avx2: std::is_x86_feature_detected!("avx2"),
            fma: std::is_x86_feature_detected!("fma"),
            avx512f: std::is_x86_feature_detected!("avx512f"),
            neon: false,
        }
    }

    /// Probe the running CPU.
    #[cfg(target_arch = "aarch64")]
    pub fn detect() -> Self {
        Self {
            neon: std::arch::is_aarch64_feature_detected!("neon"),
            ..Self::none()
        }
    }

    /// Probe the running CPU.
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    pub fn detect() -> Self {
        Self::none()
    }

    /// A CPU with no vector extensions.
    pub const fn none() -> Self {
        Self {
            sse2: false,
            avx: false,
            avx2: false,
            fma: false,
            avx512f: false,
            neon: false,
        }
    }

    /// Names of the detected extensions.
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.sse2, "sse2"),
            (self.avx, "avx"),
            (self.avx2, "avx2"),
            (self.fma, "fma"),
            (self.avx512f, "avx512f"),
            (self.neon, "neon"),
        ]
        .into_iter()
        .filter_map(|(present, name)| present.then_some(name))
        .collect()
    }
}

/// First candidate `cpu` supports, in list order.
///
/// # Errors
///
/// [`EngineError::UnsupportedCpu`] if the list is empty or no candidate is
/// supported.
pub fn select_variant(
    candidates: &[EngineVariant],
    cpu: &CpuFeatures,
) -> Result<EngineVariant, EngineError> {
    candidates
        .iter()
        .copied()
        .find(|v| v.is_supported(cpu))
        .ok_or(EngineError::UnsupportedCpu)
}
