//! Cymbalum CLI - offline rendering and inspection for the cymbal engine.

mod commands;
mod wav;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cymbalum")]
#[command(author, version, about = "Cymbalum cymbal synthesizer CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render notes through the engine to a WAV file
    Render(commands::render::RenderArgs),

    /// List the parameter table
    Params(commands::params::ParamsArgs),

    /// Show CPU features and the engine variant that would be selected
    Info(commands::info::InfoArgs),

    /// Decode a saved parameter state
    State(commands::state::StateArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Params(args) => commands::params::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::State(args) => commands::state::run(args),
    }
}
