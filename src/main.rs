use clap::{Parser, Subcommand};
use miette::{miette, Result};
use std::path::PathBuf;

use unminify_rs::cli;
use unminify_rs::cli::unminify::UnminifyArgs;

#[derive(Parser)]
#[command(name = "unminify-rs")]
#[command(about = "Restore optional chaining and nullish coalescing in transpiled JavaScript")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite JavaScript files
    Unminify {
        /// Input JavaScript files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file, or directory when several inputs are given (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum number of sweeps over each document
        #[arg(long)]
        max_passes: Option<usize>,

        /// Only accept `undefined` as the value of a short-circuited branch
        #[arg(long)]
        strict_leaves: bool,

        /// Also accept `false` and `!1` as the value of a short-circuited branch
        #[arg(long, conflicts_with = "strict_leaves")]
        false_leaves: bool,

        /// Leave expanded nullish coalescing untouched
        #[arg(long)]
        no_nullish: bool,

        /// Print rewrite statistics as JSON to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Report what would be rewritten without writing anything
    Check {
        /// Input JavaScript files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Maximum number of sweeps over each document
        #[arg(long)]
        max_passes: Option<usize>,

        /// Only accept `undefined` as the value of a short-circuited branch
        #[arg(long)]
        strict_leaves: bool,

        /// Also accept `false` and `!1` as the value of a short-circuited branch
        #[arg(long, conflicts_with = "strict_leaves")]
        false_leaves: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Unminify {
            inputs,
            output,
            max_passes,
            strict_leaves,
            false_leaves,
            no_nullish,
            stats,
        } => {
            let args = UnminifyArgs {
                inputs,
                output_path: output,
                max_passes,
                strict_leaves,
                false_leaves,
                no_nullish,
                stats,
            };
            cli::unminify::unminify(&args).map_err(|e| miette!("{}", e))
        }
        Commands::Check {
            inputs,
            max_passes,
            strict_leaves,
            false_leaves,
        } => {
            let args = UnminifyArgs {
                inputs,
                output_path: None,
                max_passes,
                strict_leaves,
                false_leaves,
                no_nullish: false,
                stats: true,
            };
            cli::unminify::check(&args).map_err(|e| miette!("{}", e))
        }
    }
}
