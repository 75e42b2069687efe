//! Saved state inspection.

use anyhow::Context;
use clap::Args;
use cymbalum_config::EngineConfig;
use cymbalum_synth::ParameterStore;
use std::path::PathBuf;

#[derive(Args)]
pub struct StateArgs {
    /// State file written by 'cymbalum render --state'
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Print the values as a config [params] table instead
    #[arg(long)]
    toml: bool,
}

pub fn run(args: StateArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let (store, summary) = ParameterStore::decode_state(&bytes);

    if args.toml {
        let params = ParameterStore::descriptors()
            .iter()
            .map(|d| (d.string_id.to_string(), f64::from(store.get(d.id))))
            .collect();
        let config = EngineConfig {
            params,
            ..EngineConfig::default()
        };
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    println!("State: {} ({} bytes)", args.file.display(), bytes.len());
    println!();
    for desc in ParameterStore::descriptors() {
        println!(
            "  {:16} {}{}",
            desc.string_id,
            store.get(desc.id),
            desc.unit.suffix()
        );
    }
    println!();
    println!(
        "Read {} value(s), {} defaulted, {} trailing byte(s) ignored",
        summary.read, summary.defaulted, summary.ignored_bytes
    );

    Ok(())
}
