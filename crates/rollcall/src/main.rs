// SPDX-FileCopyrightText: 2026 Rollcall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rollcall - event registration bot for Telegram.
//!
//! This is the binary entry point.

mod check;
mod export;
mod serve;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rollcall_config::RollcallConfig;

/// Rollcall - event registration bot for Telegram.
#[derive(Parser, Debug)]
#[command(name = "rollcall", version, about, long_about = None)]
struct Cli {
    /// Load this TOML file instead of the standard config locations.
    #[arg(long, short, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot.
    Serve,
    /// Write all registrations as CSV.
    Export {
        /// Output file. Defaults to stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Validate configuration and open the database.
    Check,
}

fn load_config(path: Option<&std::path::Path>) -> RollcallConfig {
    let loaded = match path {
        Some(path) => rollcall_config::load_and_validate_path(path),
        None => rollcall_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            rollcall_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Export { output }) => export::run_export(&config, output.as_deref()).await,
        Some(Commands::Check) => check::run_check(&config).await,
        None => {
            println!("rollcall: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("rollcall: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn export_accepts_output_and_global_config() {
        let cli = Cli::try_parse_from(["rollcall", "export", "-o", "out.csv", "--config", "r.toml"])
            .unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("r.toml")));
        match cli.command {
            Some(Commands::Export { output }) => {
                assert_eq!(output.as_deref(), Some(std::path::Path::new("out.csv")));
            }
            other => panic!("expected export, got {other:?}"),
        }
    }
}
