use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// dtswatch - keep a structure tree of TypeScript declarations up to date
#[derive(Parser, Debug)]
#[command(name = "dtswatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding tsconfig.tsruntime.json
    #[arg(long, global = true, default_value = ".")]
    pub base: PathBuf,

    /// Output as JSON (NDJSON for watch)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the declaration directory once and print the structure tree
    Parse,

    /// Watch the config file and declaration directory until Ctrl+C
    Watch {
        /// Quiescence window in milliseconds
        #[arg(long, default_value_t = dtswatch::watcher::QUIESCENCE_MS)]
        quiescence_ms: u64,

        /// Give up on a file after this many failed reads
        #[arg(long)]
        max_attempts: Option<u32>,
    },

    /// Print the effective configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["dtswatch", "parse"]).unwrap();
        assert_eq!(cli.base, PathBuf::from("."));
        assert!(!cli.json);
        assert!(matches!(cli.command, Commands::Parse));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["dtswatch", "watch", "--json", "-vv", "--base", "web"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.base, PathBuf::from("web"));
        assert!(matches!(
            cli.command,
            Commands::Watch { quiescence_ms: 500, max_attempts: None }
        ));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["dtswatch"]).is_err());
    }
}
