//! Error types for engine construction and control-thread commands.
//!
//! Nothing on the audio path returns an error; these only surface from
//! [`Engine::new`](crate::Engine::new), [`Engine::setup`](crate::Engine::setup)
//! and [`TableCommands::request`](crate::TableCommands::request).

use thiserror::Error;

/// Errors raised outside the real-time path.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// None of the candidate variants can run on this CPU.
    #[error("host CPU supports none of the requested engine variants")]
    UnsupportedCpu,

    /// Sample rate was zero, negative or not finite.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f32),

    /// Out-of-band command name was not recognized.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            EngineError::InvalidSampleRate(-1.0).to_string(),
            "invalid sample rate: -1"
        );
        assert_eq!(
            EngineError::UnknownCommand("padsynth".into()).to_string(),
            "unknown command: padsynth"
        );
        assert!(EngineError::UnsupportedCpu.to_string().contains("CPU"));
    }
}
