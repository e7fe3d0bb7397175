//! Receipt Extract CLI - structured JSON from receipt images.
//!
//! Sends receipt images to a Gemini vision model, writes the extracted JSON
//! next to each image and keeps a CSV usage report with token counts and
//! estimated cost.
//!
//! # Usage
//!
//! ```bash
//! # One image
//! receipt-extract extract example/receipt.png
//!
//! # A directory, five images per request
//! receipt-extract batch example --batch-size 5
//!
//! # A directory, one request per image
//! receipt-extract individual example
//!
//! # Guided menu
//! receipt-extract
//! ```

use clap::{CommandFactory, Parser, Subcommand};
use std::io::IsTerminal;

mod cli;
mod logging;

/// Receipt Extract - structured JSON from receipt images.
#[derive(Parser, Debug)]
#[command(name = "receipt-extract")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract a single receipt image
    Extract(cli::extract::ExtractArgs),

    /// Extract a directory with several images per request
    Batch(cli::extract::BatchArgs),

    /// Extract a directory with one request per image
    Individual(cli::extract::IndividualArgs),

    /// Show the per-model pricing table
    Pricing,

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match receipt_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `receipt-extract config path`."
            );
            receipt_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Receipt Extract v{}", receipt_core::VERSION);

    match cli.command {
        Some(Commands::Extract(args)) => cli::extract::execute_single(args).await,
        Some(Commands::Batch(args)) => cli::extract::execute_batch(args).await,
        Some(Commands::Individual(args)) => cli::extract::execute_individual(args).await,
        Some(Commands::Pricing) => cli::pricing::execute().await,
        Some(Commands::Config(args)) => cli::config::execute(args).await,
        None if std::io::stdin().is_terminal() => cli::interactive::run(&config).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_parses() {
        let cli = Cli::try_parse_from(["receipt-extract", "-v"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.verbose);
    }

    #[test]
    fn test_batch_args() {
        let cli = Cli::try_parse_from([
            "receipt-extract",
            "batch",
            "scans",
            "--batch-size",
            "3",
            "--model",
            "gemini-2.0-flash",
            "--report",
            "out.csv",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Batch(args)) => {
                assert_eq!(args.dir, std::path::PathBuf::from("scans"));
                assert_eq!(args.batch_size, Some(3));
                assert_eq!(args.common.model.as_deref(), Some("gemini-2.0-flash"));
                assert_eq!(args.common.report, Some("out.csv".into()));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_batch_size_defaults_to_config() {
        let cli = Cli::try_parse_from(["receipt-extract", "batch", "scans"]).unwrap();
        match cli.command {
            Some(Commands::Batch(args)) => assert_eq!(args.batch_size, None),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(Cli::try_parse_from(["receipt-extract", "batch", "scans", "-b", "0"]).is_err());
    }

    #[test]
    fn test_extract_requires_image() {
        assert!(Cli::try_parse_from(["receipt-extract", "extract"]).is_err());
    }

    #[test]
    fn test_individual_with_api_key() {
        let cli = Cli::try_parse_from([
            "receipt-extract",
            "individual",
            "scans",
            "--api-key",
            "abc",
            "--credential-file",
            "key.txt",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Individual(args)) => {
                assert_eq!(args.common.api_key.as_deref(), Some("abc"));
                assert_eq!(args.common.credential_file, Some("key.txt".into()));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
