//! Tether Control - compile and dispatch grounded plans.
//!
//! Compiles a plan file into its least-commitment form and dispatches it
//! against a scripted, simulated or interactive actor.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tether_common::config::{TetherConfig, CONFIG_PATH};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tetherctl")]
#[command(about = "Compile grounded plans and dispatch them under causal-link monitoring", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, global = true, default_value = CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a plan and show its links, orderings and diagnostics
    Compile {
        /// Plan file (JSON)
        plan: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Dispatch a plan through an actor
    Dispatch {
        /// Plan file (JSON)
        plan: PathBuf,

        /// Scenario file to replay (JSON)
        #[arg(long)]
        scenario: Option<PathBuf>,

        /// Actor: scripted, simulated or interactive
        #[arg(long)]
        actor: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Replay every scenario in the configured library directories
    Replay,

    /// Write a default config file
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = TetherConfig::load(&cli.config);

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compile { plan, json } => commands::compile(&plan, json),
        Commands::Dispatch {
            plan,
            scenario,
            actor,
            json,
        } => commands::dispatch(&config, &plan, scenario.as_deref(), actor.as_deref(), json),
        Commands::Replay => commands::replay(&config),
        Commands::InitConfig { path } => commands::init_config(&path),
    }
}
