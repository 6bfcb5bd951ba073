//! PetWeaver Control - CLI over the daemon's persisted state
//!
//! Read-only views of the encounter database and battle log, plus the
//! summary export for the external analysis process.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "petweaverctl")]
#[command(about = "PetWeaver - pet battle encounter knowledge base", long_about = None)]
#[command(version)]
struct Cli {
    /// Daemon data directory
    #[arg(long, default_value = "/var/lib/petweaver")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-encounter battle and victory counts
    Summary,

    /// Recent battles from the bounded battle log
    Battles {
        /// Show at most this many entries
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Everything known about one encounter
    Encounter {
        /// Encounter name as recorded
        name: String,
    },

    /// Write the encounter export file for the analysis process
    Export,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Summary => commands::summary(&cli.data_dir),
        Commands::Battles { limit } => commands::battles(&cli.data_dir, limit),
        Commands::Encounter { name } => commands::encounter(&cli.data_dir, &name),
        Commands::Export => commands::export(&cli.data_dir),
    }
}
