//! Binary entry point for cogmesh.
//!
//! This binary drives the tool surface from the command line.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use cogmesh::config::CogmeshConfig;
use cogmesh::observability;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Cogmesh - similarity-ordered graphs of content units.
#[derive(Parser)]
#[command(name = "cogmesh")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// List the available tools.
    Tools {
        /// Print full definitions, schemas included, as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the built-in strategy presets.
    Presets,

    /// Call one tool.
    Call {
        /// Tool name, e.g. `cog.add`.
        tool: String,

        /// Arguments as a JSON object.
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Run tool calls from a JSON-lines file (stdin when omitted).
    ///
    /// Each line is `{"tool": "...", "arguments": {...}}`; all calls share one
    /// set of workspace runtimes.
    Run {
        /// Input file.
        file: Option<PathBuf>,
    },

    /// Build the sample system, iterate it and print every view.
    Demo {
        /// Save the final state to this snapshot file.
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_config(&config, cli.verbose) {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Loads the configuration file, then applies environment overrides.
fn load_config(path: Option<&Path>) -> cogmesh::Result<CogmeshConfig> {
    let config = match path {
        Some(path) => CogmeshConfig::load_from_file(path)?,
        None => CogmeshConfig::load_default(),
    };
    Ok(config.with_env_overrides())
}

/// Runs the selected command.
fn run_command(cli: Cli, config: &CogmeshConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Tools { json } => commands::cmd_tools(config, json),
        Commands::Presets => commands::cmd_presets(config),
        Commands::Call { tool, args } => commands::cmd_call(config, &tool, &args),
        Commands::Run { file } => commands::cmd_run(config, file),
        Commands::Demo { snapshot } => commands::cmd_demo(snapshot),
    }
}
