mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::{assign, graph};

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Assign(args) => assign::run(&cli, args),
        Commands::Graph(args) => graph::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
