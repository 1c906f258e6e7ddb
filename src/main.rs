//! dtswatch CLI
//!
//! Usage: dtswatch [--base DIR] [--json] [-v] <COMMAND>
//!
//! Commands:
//!   parse   Scan once and print the structure tree
//!   watch   Keep the tree current and print events
//!   config  Print the effective configuration

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Parse => commands::parse::cmd_parse(&cli.base, cli.json),
        Commands::Watch {
            quiescence_ms,
            max_attempts,
        } => commands::watch::cmd_watch(&cli.base, quiescence_ms, max_attempts, cli.json),
        Commands::Config => commands::config::cmd_config(&cli.base, cli.json),
    }
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
