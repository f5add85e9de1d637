#![deny(missing_docs)]

//! # Larder Codegen CLI
//!
//! Command Line Interface for the meal planning client generator.
//!
//! Supported Commands:
//! - `generate`: Writes one method file and one test file per operation.
//! - `inspect`: Prints the parsed operation model as JSON.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;

mod error;
mod generate;
mod inspect;
mod spec;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Meal planning client generator")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate client sources from an OpenAPI document.
    Generate(generate::GenerateArgs),
    /// Print the operation model of an OpenAPI document.
    Inspect(inspect::InspectArgs),
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate(args) => {
            generate::execute(args)?;
        }
        Commands::Inspect(args) => inspect::execute(args)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_generate_flags() {
        let cli = Cli::try_parse_from([
            "larder-codegen",
            "generate",
            "--spec",
            "api.yaml",
            "--output",
            "out",
            "--config",
            "codegen.yaml",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.input.spec.to_str(), Some("api.yaml"));
                assert_eq!(args.output.to_str(), Some("out"));
                assert!(args.input.config.is_some());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
