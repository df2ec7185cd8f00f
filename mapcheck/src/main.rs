//! Level linting and inspection tool.
//!
//! Decodes Tiled level maps against a tileset, builds their schemas and
//! reports problems, or runs a level on an input for debugging.

mod cli;
mod exit_codes;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::cli::Settings;

#[derive(Parser)]
#[command(name = "mapcheck", version, about = "Validate and inspect puzzle level files")]
struct Cli {
    /// TOML config supplying defaults (tileset path, step cap).
    #[arg(long, global = true, default_value = "circuit.toml")]
    config: PathBuf,

    /// Log builder and loader decisions (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode and build every level file; exits non-zero if any is broken.
    Check {
        #[arg(long)]
        tileset: Option<PathBuf>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Validate every level in a custom-level directory.
    Scan {
        #[arg(long)]
        tileset: Option<PathBuf>,
        /// Defaults to `custom_levels_dir` from the config.
        dir: Option<PathBuf>,
    },
    /// Run a level on one input and print the output.
    Run {
        #[arg(long)]
        tileset: Option<PathBuf>,
        file: PathBuf,
        input: String,
        /// Print the element the signal visits at every step.
        #[arg(long)]
        trace: bool,
    },
    /// Print the level's keywords with their encoded forms.
    Keywords {
        #[arg(long)]
        tileset: Option<PathBuf>,
        file: PathBuf,
        /// Emit a JSON report instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    circuit::logging::init(cli.verbose);
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let settings = Settings::load(&cli.config)?;
    match cli.command {
        Command::Check { tileset, files } => {
            cli::check_levels(&settings, tileset.as_deref(), &files)
        }
        Command::Scan { tileset, dir } => {
            cli::scan_levels(&settings, tileset.as_deref(), dir.as_deref())
        }
        Command::Run {
            tileset,
            file,
            input,
            trace,
        } => cli::run_level(&settings, tileset.as_deref(), &file, &input, trace),
        Command::Keywords {
            tileset,
            file,
            json,
        } => cli::show_keywords(&settings, tileset.as_deref(), &file, json),
    }
}
