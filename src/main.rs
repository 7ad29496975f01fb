use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[cfg(test)]
mod testutil;

mod camt;
mod config;
mod dates;
mod dedup;
mod filespec;
mod fingerprint;
mod importers;
mod ledger;
mod mapper;
mod money;
mod pseudo;
mod report;
mod role;

#[derive(Debug, Parser)]
/// Converts bank statements into ledger entries.
struct Command {
    /// Logs more detail. Repeat for even more. RUST_LOG overrides this.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    subcmd: SubCommand,
}

#[derive(Debug, Subcommand)]
enum SubCommand {
    /// Inspects and upgrades import configurations.
    #[command(name = "config", subcommand)]
    Config(config::cmd::Command),
    /// Reads statement data from a given source, converts it to ledger
    /// entries, and writes them out as JSON.
    #[command(name = "import")]
    Import(importers::cmd::Command),
}

fn main() -> Result<()> {
    let cmd = Command::parse();
    init_logging(cmd.verbose);
    use SubCommand::*;
    match cmd.subcmd {
        Config(cmd) => cmd.run(),
        Import(cmd) => cmd.run(),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
