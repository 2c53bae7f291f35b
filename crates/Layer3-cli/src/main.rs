//! Easel CLI - Main entry point

mod cli;

use clap::{Parser, Subcommand};
use easel_foundation::{HostConfig, Unit};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Easel - plugin host and unit tools for the visual editor
#[derive(Parser, Debug)]
#[command(name = "easel")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Host configuration file (JSON or TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a length between px, mm and inch
    Convert {
        /// Value to convert (number or numeric string)
        value: String,

        /// Source unit
        #[arg(long, default_value = "mm")]
        from: Unit,

        /// Target unit
        #[arg(long, default_value = "px")]
        to: Unit,

        /// DPI override
        #[arg(long)]
        dpi: Option<f64>,

        /// Skip ceiling rounding on pixel output
        #[arg(long)]
        direct: bool,

        /// Round the result to this many decimal digits
        #[arg(short, long)]
        precision: Option<u32>,
    },
    /// Install the builtin plugins and list what they contribute
    Plugins {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the effective configuration to the global or project config file
    Init {
        /// Write to the global config directory instead of the project
        #[arg(long)]
        global: bool,
    },
    /// Run a scripted editing session against an in-memory surface
    Demo {
        /// Unit used for the session
        #[arg(short, long, default_value = "mm")]
        unit: Unit,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config = match &args.config {
        Some(path) => HostConfig::load_from(path)?,
        None => HostConfig::load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config: {}", e);
            HostConfig::default()
        }),
    };

    match args.command {
        Command::Convert {
            value,
            from,
            to,
            dpi,
            direct,
            precision,
        } => cli::convert(&config, &value, from, to, dpi, direct, precision),
        Command::Plugins { json } => cli::plugins(config, json).await,
        Command::Init { global } => cli::init(&config, global),
        Command::Demo { unit } => cli::demo(config, unit).await,
    }
}
