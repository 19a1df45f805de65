//! Command-line interface for inco.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::engine::Engine;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 2;

/// Contract directives for Go, compiled into build overlays.
///
/// inco turns `@require` and `@must` comments into guard code in shadow
/// copies of each file and writes an overlay manifest for
/// `go build -overlay`.
#[derive(Parser)]
#[command(name = "inco")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate shadow files and the overlay manifest
    #[command(visible_alias = "generate")]
    Gen(GenArgs),
    /// Remove the cache directory
    Clean(CleanArgs),
}

/// Arguments for the gen command.
#[derive(Parser)]
pub struct GenArgs {
    /// Module root to process
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log per-file progress
    #[arg(short, long)]
    pub verbose: bool,
}

/// Arguments for the clean command.
#[derive(Parser)]
pub struct CleanArgs {
    /// Module root whose cache is removed
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Commands {
    pub fn verbose(&self) -> bool {
        match self {
            Commands::Gen(args) => args.verbose,
            Commands::Clean(_) => false,
        }
    }
}

fn engine(path: &Path, config: Option<&PathBuf>) -> anyhow::Result<Engine> {
    let engine = match config {
        Some(file) => Engine::with_config(path, Config::parse_file(file)?)?,
        None => Engine::new(path)?,
    };
    Ok(engine)
}

/// Run the gen command.
pub fn run_gen(args: &GenArgs) -> anyhow::Result<i32> {
    let mut engine = engine(&args.path, args.config.as_ref())?;
    let manifest = engine.run()?;

    if manifest.is_empty() {
        println!("inco: {}", "no contracts found".dimmed());
    } else {
        println!(
            "inco: overlay written to {} ({} file(s) mapped)",
            engine.manifest_path().display().to_string().green(),
            manifest.len()
        );
    }
    Ok(EXIT_SUCCESS)
}

/// Run the clean command.
pub fn run_clean(args: &CleanArgs) -> anyhow::Result<i32> {
    let engine = engine(&args.path, args.config.as_ref())?;
    if engine.clean()? {
        println!("inco: removed {}", engine.cache_dir().display());
    } else {
        println!("inco: nothing to clean");
    }
    Ok(EXIT_SUCCESS)
}
