//! CLI command implementations for ncore

use clap::{Parser, Subcommand};

use crate::error::CliResult;

pub mod expand;
pub mod run;

/// ncore - per-core neuromorphic runtime driver
#[derive(Parser, Debug)]
#[command(
    name = "ncore",
    version,
    about = "Drive one simulated neuromorphic core",
    long_about = "ncore expands a procedural connectivity description into a synaptic \
                  matrix, then runs the timestep scheduler over it and reports provenance."
)]
pub struct NcoreCli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Expand connectivity and run the scheduler
    Run(run::RunCommand),

    /// Expand connectivity only and summarise the matrix
    Expand(expand::ExpandCommand),
}

impl NcoreCli {
    /// Execute the CLI command
    pub fn execute(self) -> CliResult<()> {
        match self.command {
            Commands::Run(cmd) => cmd.execute(),
            Commands::Expand(cmd) => cmd.execute(),
        }
    }
}

/// Write `json` to `path`, or to stdout when no path is given
pub(crate) fn emit_json(json: &str, path: Option<&std::path::Path>) -> CliResult<()> {
    match path {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
