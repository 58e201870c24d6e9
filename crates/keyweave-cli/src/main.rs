//! Debug CLI for the keyweave macro engine.
//!
//! Not the mapping GUI: this is the tool you reach for when a macro
//! misbehaves, to check its diagnostics, inspect its capability map, or dry
//! run it against stdout instead of a virtual device.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "keyweave", version, about = "Macro language tools for keyboard remapping")]
struct Cli {
    /// JSON file with global timing knobs, e.g. {"keystroke_sleep_ms": 10}.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse macro source and print the tree, or the compile error.
    Check { source: String },
    /// Print the capability map as JSON.
    Caps { source: String },
    /// Run a macro, printing each emitted event with a timestamp.
    Exec {
        source: String,
        /// Arm the holding flag at start and release it after this many ms.
        #[arg(long)]
        hold_ms: Option<u64>,
        /// Override the inter-keystroke sleep for this run.
        #[arg(long)]
        keystroke_sleep_ms: Option<u64>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match commands::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Check { source } => commands::check::run(&source, &config),
        Command::Caps { source } => commands::caps::run(&source, &config),
        Command::Exec {
            source,
            hold_ms,
            keystroke_sleep_ms,
        } => {
            let mut config = config;
            if let Some(ms) = keystroke_sleep_ms {
                config.set_keystroke_sleep_ms(ms);
            }
            commands::exec::run(&source, &config, hold_ms)
        }
    }
}
