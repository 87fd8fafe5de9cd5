//! xai-study-server: serve the study over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use xai_study::{server, Study, StudyConfig};

/// Explanation-treatment user study server
#[derive(Parser)]
#[command(name = "xai-study-server")]
#[command(about = "Serve the guessing / teaching / testing study over HTTP", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file (defaults used when omitted)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Listen address (overrides `bind_addr` from the config)
    #[arg(long)]
    bind: Option<String>,

    /// Do not write the interaction log
    #[arg(long)]
    no_log: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    xai_study::init_tracing();
    let cli = Cli::parse();

    let mut config = StudyConfig::load_or_default(cli.config.as_deref())
        .context("loading configuration")?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    let bind_addr = config.bind_addr.clone();

    let study = Study::builder()
        .config(config)
        .interaction_log(!cli.no_log)
        .build()
        .context("starting study")?;
    info!(
        "Study ready: images at {}, responses to {}",
        study.config().image_root.display(),
        study.config().table_path.display()
    );

    server::run(Arc::new(study), &bind_addr)
        .await
        .with_context(|| format!("serving on {bind_addr}"))?;
    Ok(())
}
