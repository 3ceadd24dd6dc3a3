//! clap-based command-line interface.
//!
//! Defines the [`Cli`] struct with the [`Command`] subcommands (demo,
//! config) and the global `--verbose` flag.

use clap::{Parser, Subcommand};

/// flowstat — batch status aggregation and completion tracking.
#[derive(Debug, Parser)]
#[command(name = "flowstat", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enables verbose (debug-level) output.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Runs the built-in demonstration: a tracked batch, a polled job set
    /// and one workflow walked through its lifecycle.
    Demo {
        /// Number of demo jobs to submit and poll.
        #[arg(long, default_value_t = 3)]
        jobs: usize,
    },

    /// Prints the effective configuration.
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_demo_subcommand() {
        let cli = Cli::parse_from(["flowstat", "demo", "--jobs", "5"]);
        match cli.command {
            Command::Demo { jobs } => assert_eq!(jobs, 5),
            _ => panic!("expected Demo command"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from(["flowstat", "--verbose", "config"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Config));
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
