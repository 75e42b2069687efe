//! Shared argument parsing and config loading.

use cymbalum_config::EngineConfig;
use std::path::Path;
use std::str::FromStr;

/// Parse a `key=value` parameter override.
pub fn parse_key_val(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid parameter format: '{s}' (expected key=value)"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid value for '{}': '{}'", key.trim(), value.trim()))?;
    Ok((key.trim().to_string(), value))
}

/// Load the config file, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => Ok(EngineConfig::load(path)?),
        None => Ok(EngineConfig::default()),
    }
}

/// One note to render: `PITCH@START-END[:VELOCITY]`, times in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteSpec {
    /// MIDI pitch
    pub pitch: i16,
    /// Note-on time in seconds
    pub start: f64,
    /// Note-off time in seconds
    pub end: f64,
    /// Velocity in `[0, 1]`
    pub velocity: f32,
}

impl NoteSpec {
    /// Note-on and note-off sample positions.
    pub fn sample_range(&self, sample_rate: u32) -> (usize, usize) {
        let to_samples = |t: f64| (t * f64::from(sample_rate)).round() as usize;
        (to_samples(self.start), to_samples(self.end))
    }
}

impl FromStr for NoteSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (note, velocity) = match s.split_once(':') {
            Some((note, vel)) => {
                let vel = vel
                    .parse::<f32>()
                    .map_err(|_| format!("Invalid velocity in '{s}'"))?;
                (note, vel)
            }
            None => (s, 1.0),
        };
        let (pitch, times) = note
            .split_once('@')
            .ok_or_else(|| format!("Invalid note '{s}' (expected PITCH@START-END)"))?;
        let (start, end) = times
            .split_once('-')
            .ok_or_else(|| format!("Invalid note '{s}' (expected PITCH@START-END)"))?;

        let pitch = pitch
            .parse::<i16>()
            .ok()
            .filter(|p| (0..=127).contains(p))
            .ok_or_else(|| format!("Invalid pitch in '{s}' (expected 0-127)"))?;
        let start = start
            .parse::<f64>()
            .map_err(|_| format!("Invalid start time in '{s}'"))?;
        let end = end
            .parse::<f64>()
            .map_err(|_| format!("Invalid end time in '{s}'"))?;

        if !(start.is_finite() && end.is_finite()) || start < 0.0 || end < start {
            return Err(format!("Invalid note times in '{s}' (need 0 <= start <= end)"));
        }
        if !(0.0..=1.0).contains(&velocity) {
            return Err(format!("Velocity in '{s}' must be within 0-1"));
        }

        Ok(Self {
            pitch,
            start,
            end,
            velocity,
        })
    }
}
