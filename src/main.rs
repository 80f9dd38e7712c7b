//! Main entry point for Orpheus application.

// #![deny(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
// #![warn(missing_docs)]

use clap::{Parser, Subcommand};

pub mod common;
pub mod config;
pub mod data;
pub mod error;
pub mod gene_id;
pub mod pipeline;
pub mod report;
pub mod score;
pub mod select;

/// CLI parser based on clap.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "orpheus - transcript ORF confidence scoring",
    long_about = "This tool scores predicted transcript ORFs from a de novo assembly using ORF \
                  completeness, homology and BUSCO evidence, and selects representative \
                  transcripts per gene"
)]
struct Cli {
    /// Commonly used arguments
    #[command(flatten)]
    common: common::Args,

    /// The sub command to run
    #[command(subcommand)]
    command: Commands,
}

/// Enum supporting the parsing of top-level commands.
#[allow(clippy::large_enum_variant)]
#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the pipeline from the given entry stage and score the transcripts.
    Run(pipeline::Args),
    /// Show the stage plan and where each intermediate artifact would be taken from.
    Resolve(pipeline::ResolveArgs),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Build a tracing subscriber according to the configuration in `cli.common`.
    let collector = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_max_level(match cli.common.verbose.log_level() {
            Some(level) => match level {
                log::Level::Error => tracing::Level::ERROR,
                log::Level::Warn => tracing::Level::WARN,
                log::Level::Info => tracing::Level::INFO,
                log::Level::Debug => tracing::Level::DEBUG,
                log::Level::Trace => tracing::Level::TRACE,
            },
            None => tracing::Level::INFO,
        })
        .compact()
        .finish();
    tracing::subscriber::set_global_default(collector)?;

    tracing::info!("Starting ORPHEUS -- scoring transcripts from the underworld...");

    match &cli.command {
        Commands::Run(args) => pipeline::run(&cli.common, args).await?,
        Commands::Resolve(args) => pipeline::run_resolve(&cli.common, args)?,
    }

    tracing::info!("All done. Have a nice day!");

    Ok(())
}
