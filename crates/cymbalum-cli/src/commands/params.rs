//! Parameter table listing.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use cymbalum_synth::{ParamDescriptor, ParameterStore};

#[derive(Args)]
pub struct ParamsArgs {
    /// Only show parameters in this group (body, excitation, lfo, ...)
    #[arg(short, long)]
    group: Option<String>,
}

fn format_value(desc: &ParamDescriptor, value: f32) -> String {
    if desc.is_stepped() {
        format!("{value:.0}{}", desc.unit.suffix())
    } else {
        format!("{value}{}", desc.unit.suffix())
    }
}

pub fn run(args: ParamsArgs) -> anyhow::Result<()> {
    let descriptors: Vec<&ParamDescriptor> = ParameterStore::descriptors()
        .iter()
        .filter(|d| {
            args.group
                .as_deref()
                .is_none_or(|g| d.group.eq_ignore_ascii_case(g))
        })
        .collect();

    if descriptors.is_empty() {
        anyhow::bail!(
            "No parameters in group '{}'",
            args.group.as_deref().unwrap_or_default()
        );
    }

    println!("Parameters");
    println!("==========");
    println!();
    println!(
        "  {:>3}  {:16}  {:12}  {:>12}  {}",
        "Id", "Name", "Group", "Default", "Range"
    );
    println!(
        "  {:>3}  {:16}  {:12}  {:>12}  {}",
        "--", "----", "-----", "-------", "-----"
    );

    for desc in descriptors {
        let group = if desc.group.is_empty() { "-" } else { desc.group };
        println!(
            "  {:>3}  {:16}  {:12}  {:>12}  {} .. {}",
            desc.id.0,
            desc.string_id,
            group,
            format_value(desc, desc.default),
            format_value(desc, desc.min),
            format_value(desc, desc.max),
        );
    }

    println!();
    println!("Set values in a config [params] table or with 'cymbalum render --param name=value'.");

    Ok(())
}
