//! CPU feature and engine variant report.

use super::common::load_config;
use clap::Args;
use cymbalum_synth::{CpuFeatures, EngineVariant, select_variant};
use std::path::PathBuf;

#[derive(Args)]
pub struct InfoArgs {
    /// Engine config file whose variant list to check
    #[arg(short, long)]
    config: Option<PathBuf>,
}

pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let candidates = config.candidates()?;
    let cpu = CpuFeatures::detect();

    let features = cpu.names();
    println!(
        "CPU features: {}",
        if features.is_empty() {
            "none detected".to_string()
        } else {
            features.join(", ")
        }
    );
    println!();
    println!("Engine variants:");
    for variant in EngineVariant::ALL {
        let status = if variant.is_supported(&cpu) {
            "supported"
        } else {
            "unsupported"
        };
        let listed = if candidates.contains(&variant) {
            ""
        } else {
            " (not a candidate)"
        };
        println!(
            "  {:8} {:>2} lanes  {}{}",
            variant.name(),
            variant.lanes(),
            status,
            listed
        );
    }
    println!();

    match select_variant(&candidates, &cpu) {
        Ok(variant) => println!("Selected: {variant}"),
        Err(e) => println!("Selected: none ({e})"),
    }

    Ok(())
}
