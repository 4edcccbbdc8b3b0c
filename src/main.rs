mod balance;
mod commands;
mod config;
mod diagnostics;
mod error;
mod hasher;
mod inspect;
mod locate;
mod patch;
mod persist;
mod recipe;
mod scanner;
mod steps;
mod types;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "srcsplice",
    version,
    about = "Recipe-driven source splicing with loud failures and atomic writes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply recipes to their target files
    Apply {
        /// Preview: run every step and check, write nothing
        #[arg(long)]
        dry_run: bool,
        /// Recipe files, or directories of `*.toml` recipes
        #[arg(required = true)]
        recipes: Vec<PathBuf>,
        /// Patch this file instead of the recipe's target (single recipe only)
        #[arg(long)]
        target: Option<PathBuf>,
    },
    /// Verify recipes would apply cleanly, without writing
    Check {
        /// Recipe files, or directories of `*.toml` recipes
        #[arg(required = true)]
        recipes: Vec<PathBuf>,
        /// Check against this file instead of the recipe's target
        #[arg(long)]
        target: Option<PathBuf>,
    },
    /// Report delimiter problems and blank-line runs in a file (read-only)
    Inspect {
        /// File to inspect
        file: PathBuf,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Apply { dry_run, recipes, target } => {
            commands::apply(&recipes, target.as_deref(), dry_run)
        },
        Commands::Check { recipes, target } => commands::apply(&recipes, target.as_deref(), true),
        Commands::Inspect { file, json } => commands::inspect(&file, json),
    };

    // Exit codes: 0 success, 1 inspect findings, 2 patch failure, 3 anything else.
    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            if e.is_patch_failure() { ExitCode::from(2) } else { ExitCode::from(3) }
        },
    };
}
