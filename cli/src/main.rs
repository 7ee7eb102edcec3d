#![deny(missing_docs)]

//! # JSON:API Select CLI
//!
//! Command Line Interface for parsing JSON:API documents against declared
//! resource descriptors.
//!
//! Supported Commands:
//! - `select`: Flattens a document using a descriptor registry file.
//! - `page-params`: Prints the page parameters of a pagination link.
//! - `page-url`: Writes page parameters onto a URL.

use crate::error::CliResult;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod error;
mod pages;
mod select;

#[derive(Parser, Debug)]
#[clap(author, version, about = "JSON:API document selector")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` wins.
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a document and print the flattened result.
    Select(select::SelectArgs),
    /// Print the page parameters of a link.
    PageParams(pages::PageParamsArgs),
    /// Write page parameters onto a URL.
    PageUrl(pages::PageUrlArgs),
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Select(args) => select::execute(args)?,
        Commands::PageParams(args) => pages::execute_params(args)?,
        Commands::PageUrl(args) => pages::execute_url(args)?,
    }

    Ok(())
}
