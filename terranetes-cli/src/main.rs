//! `terranetes` entry point: parse flags, set up logging, run the command.

use clap::Parser;
use color_eyre::eyre::Report;
use terranetes_cli::cli::CommandLine;
use terranetes_cli::{commands, logging};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = CommandLine::parse();
    logging::init(cli.verbose).map_err(Report::from)?;
    commands::run(&cli).map_err(Report::from)
}
