//! Ember CLI - headless driver and configuration tools for the Ember runtime

mod commands;
mod demo;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{config, simulate};

#[derive(Parser)]
#[command(name = "ember")]
#[command(about = "Fixed-timestep entity runtime for 2D games", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo game headlessly and report what the scheduler did
    Simulate {
        /// Path to a TOML config file
        #[arg(long)]
        config: Option<String>,

        /// Number of host frames to feed
        #[arg(long, default_value = "600")]
        frames: u64,

        /// Milliseconds between host frames
        #[arg(long, default_value = "16.667")]
        frame_ms: f64,

        /// Insert a stall every K frames
        #[arg(long)]
        stall_every: Option<u64>,

        /// Length of each stall in milliseconds
        #[arg(long, default_value = "50")]
        stall_ms: f64,

        /// Tap the pause key on these frames (comma separated)
        #[arg(long, value_delimiter = ',')]
        pause_at: Vec<u64>,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,
    },

    /// Validate and print the resolved configuration
    Config {
        /// Path to a TOML config file
        #[arg(long)]
        config: Option<String>,
    },
}

fn parse_format(s: &str) -> Result<String, String> {
    match s {
        "text" | "json" => Ok(s.to_string()),
        _ => Err(format!("unknown format '{}'; valid values: text, json", s)),
    }
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            frames,
            frame_ms,
            stall_every,
            stall_ms,
            pause_at,
            format,
        } => simulate::run(simulate::SimulateArgs {
            config,
            frames,
            frame_ms,
            stall_every,
            stall_ms,
            pause_at,
            format,
        }),
        Commands::Config { config: path } => config::run(path.as_deref()),
    }
}
