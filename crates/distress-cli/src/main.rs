mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analyze::AnalyzeArgs;
use commands::features::ExtractFeaturesArgs;
use commands::tier::TierArgs;

/// Financial distress risk scoring and attribution
#[derive(Parser)]
#[command(
    name = "dra",
    version,
    about = "Financial distress risk scoring and attribution",
    long_about = "Scores the financial-distress risk of a listed company from a market and \
                  fundamental data snapshot using externally trained model artifacts, and \
                  explains the score with per-feature and per-category contributions and a \
                  tiered assessment narrative."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis pipeline against a data snapshot
    Analyze(AnalyzeArgs),
    /// Derive the canonical feature vector from a data snapshot
    ExtractFeatures(ExtractFeaturesArgs),
    /// Map a distress probability to its risk tier
    Tier(TierArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(args),
        Commands::ExtractFeatures(args) => commands::features::run_extract_features(args),
        Commands::Tier(args) => commands::tier::run_tier(args),
        Commands::Version => {
            println!("dra {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
