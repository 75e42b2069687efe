//! Engine configuration file.

use std::collections::BTreeMap;
use std::path::Path;

use cymbalum_synth::{Engine, EngineOptions, EngineVariant, ParameterStore};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::validation::validate_param;

/// How the engine is driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Notes drive the oscillators; no audio input.
    #[default]
    Instrument,
    /// An input signal is mixed into the excitation path.
    Effect,
}

/// Engine configuration, loadable from TOML.
///
/// Parameter values are plain real values (`decay = 3.5` seconds), keyed by
/// string id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,

    /// Host block size in samples.
    pub block_size: usize,

    /// Instrument or effect.
    pub role: Role,

    /// Variant names to try, in order. Empty means all variants.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,

    /// Plain parameter values by string id.
    pub params: BTreeMap<String, f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            block_size: 256,
            role: Role::Instrument,
            variants: Vec::new(),
            params: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(
            path = %path.display(),
            sample_rate = config.sample_rate,
            params = config.params.len(),
            "loaded engine config"
        );
        Ok(config)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Set a plain parameter value by string id.
    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Check everything that can be checked without building an engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(cymbalum_synth::EngineError::InvalidSampleRate(0.0).into());
        }
        if self.block_size == 0 {
            return Err(ConfigError::invalid_parameter(
                "block_size",
                "must be greater than zero",
            ));
        }
        self.candidates()?;
        for (name, &value) in &self.params {
            validate_param(name, value)?;
        }
        Ok(())
    }

    /// Resolve `variants` to engine variants.
    pub fn candidates(&self) -> Result<Vec<EngineVariant>, ConfigError> {
        if self.variants.is_empty() {
            return Ok(EngineVariant::ALL.to_vec());
        }
        self.variants
            .iter()
            .map(|name| {
                EngineVariant::from_name(name)
                    .ok_or_else(|| ConfigError::UnknownVariant(name.clone()))
            })
            .collect()
    }

    /// Construction options for [`Engine::new`].
    pub fn engine_options(&self) -> Result<EngineOptions, ConfigError> {
        Ok(EngineOptions {
            candidates: self.candidates()?,
            sample_rate: self.sample_rate as f32,
        })
    }

    /// Write every configured parameter into `store`.
    ///
    /// All values are validated first; on error the store is untouched.
    pub fn apply_params(&self, store: &mut ParameterStore) -> Result<(), ConfigError> {
        let values = self
            .params
            .iter()
            .map(|(name, &value)| validate_param(name, value))
            .collect::<Result<Vec<_>, _>>()?;

        for (id, value) in values {
            store.set_plain(id, value);
        }
        Ok(())
    }

    /// A default store with the configured parameters applied.
    pub fn parameter_store(&self) -> Result<ParameterStore, ConfigError> {
        let mut store = ParameterStore::new();
        self.apply_params(&mut store)?;
        Ok(store)
    }

    /// Build, set up and parameterize an engine.
    ///
    /// The returned engine has had `set_parameters` called once, so the
    /// first block already runs with the configured values.
    pub fn build_engine(&self) -> Result<Engine, ConfigError> {
        self.validate()?;
        let mut engine = Engine::new(self.engine_options()?)?;
        engine.setup(self.sample_rate as f32)?;
        self.apply_params(engine.params_mut())?;
        engine.startup();
        engine.set_parameters(None);
        Ok(engine)
    }
}
