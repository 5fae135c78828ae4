//! Notebook Cat
//!
//! Combine many small files into few NotebookLM sources
//!
//! # Usage
//!
//! ```bash
//! # Pack everything in ./transcripts into ./sources (free plan: 50 sources)
//! notebook-cat ./transcripts ./sources
//!
//! # Plus plan, only JSON files, text taken from a nested field
//! notebook-cat ./exports ./sources --plus-plan --extensions json --json-path content.text
//!
//! # Preview, then continue an interrupted run
//! notebook-cat ./transcripts ./sources --dry-run
//! notebook-cat ./transcripts ./sources --resume
//! ```

mod config;

use anyhow::Result;
use clap::Parser;
use config::Args;
use packing::{PackError, PackErrorKind};
use std::process::ExitCode;
use tracing::info;

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<PackError>().map(PackError::kind) {
        Some(PackErrorKind::NotFound) => 2,
        Some(PackErrorKind::PermissionDenied) => 3,
        Some(PackErrorKind::SourceLimitExceeded) => 4,
        _ => 1,
    }
}

async fn run(args: Args) -> Result<()> {
    let config = args.to_pack_config()?;
    info!(
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        word_limit = config.word_limit,
        source_limit = config.source_limit,
        "Notebook Cat starting"
    );

    let report = packing::run(&config).await?;
    println!("{report}");

    if let Some(path) = &report.summary_path {
        info!(summary = %path.display(), sources = report.outputs.len(), "Output written");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(hint) = e
                .downcast_ref::<PackError>()
                .and_then(PackError::recovery_suggestion)
            {
                eprintln!("Hint: {hint}");
            }
            ExitCode::from(exit_code(&e))
        }
    }
}
