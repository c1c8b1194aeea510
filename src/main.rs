//! condaci CLI
//!
//! Entry point for the `condaci` command-line tool.

use clap::{Parser, Subcommand};
use condaci::{Pipeline, PipelineOutcome};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "condaci")]
#[command(about = "Sets up miniconda, builds, and uploads conda packages from CI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Setup a miniconda environment
    Setup {
        /// Extra conda channels to add, highest precedence first
        #[arg(long, num_args = 1..)]
        channels: Vec<String>,
    },

    /// Run a conda build and upload the result if appropriate
    Build {
        /// Path to the dir containing the conda 'meta.yaml' build script
        recipe_dir: PathBuf,
    },

    /// Print the detected package version
    Version {
        /// Path to the dir containing the conda 'meta.yaml' build script
        recipe_dir: PathBuf,
    },

    /// Print the miniconda root directory
    MinicondaDir,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Setup { channels } => {
            Pipeline::from_env().and_then(|p| p.setup(&channels).map(|_| PipelineOutcome::Completed))
        }
        Commands::Build { recipe_dir } => Pipeline::from_env().and_then(|p| p.build(&recipe_dir)),
        Commands::Version { recipe_dir } => Pipeline::from_env_quiet(true)
            .and_then(|p| p.print_version(&recipe_dir).map(|_| PipelineOutcome::Completed)),
        Commands::MinicondaDir => Pipeline::from_env_quiet(true).map(|p| {
            println!("{}", p.miniconda().root().display());
            PipelineOutcome::Completed
        }),
    };

    match result {
        Ok(_) => {}
        Err(e) => {
            eprintln!("condaci: {}", e);
            process::exit(e.exit_code());
        }
    }
}
