//! Offline rendering command.

use super::common::{NoteSpec, load_config, parse_key_val};
use crate::wav;
use anyhow::{Context, bail};
use clap::Args;
use cymbalum_config::Role;
use std::path::PathBuf;

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Engine config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Notes as PITCH@START-END[:VELOCITY], times in seconds
    #[arg(short, long, value_delimiter = ',')]
    notes: Vec<NoteSpec>,

    /// Total length in seconds (default: last note-off or input end, plus the tail)
    #[arg(short, long)]
    duration: Option<f64>,

    /// Ring-out time after the last note-off, in seconds
    #[arg(long, default_value = "2.0")]
    tail: f64,

    /// Sample rate (overrides the config)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Host block size (overrides the config)
    #[arg(long)]
    block_size: Option<usize>,

    /// Random seed (overrides the config)
    #[arg(long)]
    seed: Option<u16>,

    /// Host tempo in BPM
    #[arg(long, default_value = "120.0")]
    tempo: f64,

    /// Parameter override as name=value, plain units (repeatable)
    #[arg(short, long = "param", value_parser = parse_key_val)]
    params: Vec<(String, f64)>,

    /// Input WAV mixed into the excitation (required for the effect role)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Restore a saved parameter state before applying the config
    #[arg(long, value_name = "FILE")]
    load_state: Option<PathBuf>,

    /// Write the parameter state to this file after rendering
    #[arg(long, value_name = "FILE")]
    state: Option<PathBuf>,
}

/// A note event at an absolute sample position.
#[derive(Debug, Clone, Copy)]
struct Scheduled {
    sample: usize,
    on: bool,
    id: i32,
    pitch: i16,
    velocity: f32,
}

fn schedule(notes: &[NoteSpec], sample_rate: u32) -> Vec<Scheduled> {
    let mut events = Vec::with_capacity(notes.len() * 2);
    for (id, note) in notes.iter().enumerate() {
        let (on, off) = note.sample_range(sample_rate);
        let event = Scheduled {
            sample: on,
            on: true,
            id: id as i32,
            pitch: note.pitch,
            velocity: note.velocity,
        };
        events.push(event);
        events.push(Scheduled {
            sample: off,
            on: false,
            ..event
        });
    }
    events.sort_by_key(|e| e.sample);
    events
}

fn seconds_to_samples(seconds: f64, sample_rate: u32, what: &str) -> anyhow::Result<usize> {
    if !seconds.is_finite() || seconds < 0.0 {
        bail!("{what} must be a non-negative number of seconds, got {seconds}");
    }
    Ok((seconds * f64::from(sample_rate)).round() as usize)
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(rate) = args.sample_rate {
        config.sample_rate = rate;
    }
    if let Some(size) = args.block_size {
        config.block_size = size;
    }
    if let Some(seed) = args.seed {
        config.params.insert("seed".to_string(), f64::from(seed));
    }
    for (name, value) in &args.params {
        config.params.insert(name.clone(), *value);
    }
    config.validate()?;

    let sample_rate = config.sample_rate;

    let input = match &args.input {
        Some(path) => {
            println!("Reading {}...", path.display());
            let (samples, rate) = wav::read_mono(path)?;
            if rate != sample_rate {
                bail!("input is {rate} Hz but the engine runs at {sample_rate} Hz");
            }
            Some(samples)
        }
        None if config.role == Role::Effect => {
            bail!("the effect role needs an --input WAV file");
        }
        None => None,
    };

    if args.notes.is_empty() && input.is_none() {
        tracing::warn!("no notes and no input, rendering silence");
    }

    let mut engine = config.build_engine()?;

    if let Some(path) = &args.load_state {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        engine.decode_state(&bytes);
        config.apply_params(engine.params_mut())?;
        engine.startup();
    }

    let tail = seconds_to_samples(args.tail, sample_rate, "tail")?;
    let events = schedule(&args.notes, sample_rate);
    let total = match (args.duration, &input) {
        (Some(duration), _) => seconds_to_samples(duration, sample_rate, "duration")?,
        (None, Some(samples)) => samples.len() + tail,
        (None, None) => events.last().map_or(0, |e| e.sample) + tail,
    };

    println!(
        "Rendering {} note(s) with the {} engine at {} Hz, block size {}...",
        args.notes.len(),
        engine.variant(),
        sample_rate,
        config.block_size
    );

    let mut output = vec![0.0f32; total];
    let mut next = 0;
    let mut dropped = 0usize;

    for (index, block) in output.chunks_mut(config.block_size).enumerate() {
        let start = index * config.block_size;
        let end = start + block.len();

        engine.set_parameters(Some(args.tempo));

        while next < events.len() && events[next].sample < end {
            let e = events[next];
            let offset = e.sample.saturating_sub(start) as u32;
            if !engine.push_midi_note(e.on, offset, e.id, e.pitch, 0.0, e.velocity) {
                dropped += 1;
            }
            next += 1;
        }

        match &input {
            Some(samples) => {
                let from = start.min(samples.len());
                let to = end.min(samples.len());
                engine.process(&[&samples[from..to]], &mut [block]);
            }
            None => engine.process(&[], &mut [block]),
        }
    }

    if dropped > 0 {
        tracing::warn!(dropped, "note events dropped, event queue was full");
    }

    wav::write_mono(&args.output, &output, sample_rate)?;

    let peak = output.iter().fold(0.0f32, |m, x| m.max(x.abs()));
    println!(
        "Wrote {} ({} samples, {:.2}s, peak {:.3})",
        args.output.display(),
        output.len(),
        output.len() as f64 / f64::from(sample_rate),
        peak
    );

    if let Some(path) = &args.state {
        std::fs::write(path, engine.encode_state())
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Saved state to {}", path.display());
    }

    Ok(())
}
