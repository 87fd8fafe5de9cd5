//! xai-study-analyze: post-hoc statistics over the response table.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use xai_study::analysis::AnalysisReport;

/// Report format
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// Human-readable summary
    Text,
    /// Machine-readable JSON
    Json,
}

/// Analyze collected study responses
#[derive(Parser)]
#[command(name = "xai-study-analyze")]
#[command(about = "Accuracy, confusion and treatment comparison over the response table", long_about = None)]
#[command(version)]
struct Cli {
    /// Response table (CSV)
    #[arg(default_value = "data/user_guesses.csv")]
    table: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

fn main() -> Result<()> {
    xai_study::init_tracing();
    let cli = Cli::parse();

    let report = AnalysisReport::load(&cli.table)
        .with_context(|| format!("analyzing {}", cli.table.display()))?;

    match cli.format {
        Format::Text => print!("{report}"),
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
