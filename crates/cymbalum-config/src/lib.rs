//! Configuration for the cymbalum engine.
//!
//! A TOML file picks the sample rate, host block size, role and candidate
//! engine variants, and gives plain parameter values by string id.
//!
//! # Example
//!
//! ```rust
//! use cymbalum_config::{EngineConfig, Role};
//! use cymbalum_synth::Param;
//!
//! let config = EngineConfig::from_toml(
//!     r#"
//! sample_rate = 44100
//! role = "instrument"
//! variants = ["scalar"]
//!
//! [params]
//! units = 8
//! decay = 3.5
//! "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.role, Role::Instrument);
//! let engine = config.build_engine().unwrap();
//! assert_eq!(engine.params().get_int(Param::Units), 8);
//! ```

mod config;
mod error;

/// Parameter name and value validation.
pub mod validation;

pub use config::{EngineConfig, Role};
pub use error::ConfigError;
pub use validation::{find_param, normalize_param_name, validate_param};
