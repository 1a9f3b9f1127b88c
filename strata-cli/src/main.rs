// SPDX-License-Identifier: AGPL-3.0-or-later
//! Strata CLI
//!
//! Browse and edit an overlay filesystem described by a mount table.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "strata")]
#[command(author, version, about = "Strata - overlay filesystem over mounted loaders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Mount table to use (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List directory contents
    #[command(alias = "dir")]
    Ls {
        /// Virtual path to list (defaults to the root)
        #[arg(default_value = "")]
        path: String,

        /// Long format with details
        #[arg(short, long)]
        long: bool,

        /// Human-readable sizes
        #[arg(short = 'H', long)]
        human: bool,
    },

    /// Display file contents
    Cat {
        /// File to display
        path: String,
    },

    /// Show file or directory information
    Stat {
        /// Virtual path to inspect
        path: String,

        /// Print the entry as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the loader-side path a virtual path resolves to
    Realpath {
        /// Virtual path to resolve
        path: String,
    },

    /// Write stdin or a local file to a virtual path
    Put {
        /// Destination virtual path
        path: String,

        /// Local file to copy instead of stdin
        #[arg(short, long)]
        from: Option<PathBuf>,
    },

    /// List active mounts
    Mounts,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Ls { path, long, human } => commands::ls(config, &path, long, human),
        Commands::Cat { path } => commands::cat(config, &path),
        Commands::Stat { path, json } => commands::stat(config, &path, json),
        Commands::Realpath { path } => commands::realpath(config, &path),
        Commands::Put { path, from } => commands::put(config, &path, from.as_deref()),
        Commands::Mounts => commands::mounts(config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
