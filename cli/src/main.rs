mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{address, identify, lookup, route, search, tile};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise each `-v` raises the level by one.
fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);
    match &cli.command {
        Commands::Identify(args) => identify::run(&cli, args),
        Commands::Lookup(args) => lookup::run(&cli, args),
        Commands::Tile(args) => tile::run(&cli, args),
        Commands::Route(args) => route::run(&cli, args),
        Commands::Address(args) => address::run(&cli, args),
        Commands::Search(args) => search::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
