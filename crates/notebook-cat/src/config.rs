//! CLI arguments and configuration layering.
//!
//! Precedence, lowest first: built-in defaults, `NOTEBOOK_CAT_*`
//! environment variables, an optional TOML file, command-line flags.

use anyhow::{Context, Result};
use clap::Parser;
use packing::{parse_extensions, PackConfig, PLUS_SOURCE_LIMIT};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Combine text, Markdown and JSON files into NotebookLM-sized sources.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory containing the files to combine
    pub input_dir: PathBuf,

    /// Directory receiving notebooklm_source_NNN.txt files and the summary
    pub output_dir: PathBuf,

    /// Use the NotebookLM Plus source limit (300)
    #[arg(long, default_value_t = false, conflicts_with = "limit")]
    pub plus_plan: bool,

    /// Custom source limit (overrides NOTEBOOK_CAT_SOURCE_LIMIT)
    #[arg(long)]
    pub limit: Option<u32>,

    /// Maximum words per source (overrides NOTEBOOK_CAT_WORD_LIMIT)
    #[arg(long)]
    pub word_limit: Option<u64>,

    /// Comma-separated extensions to include, e.g. "txt,md"
    #[arg(long)]
    pub extensions: Option<String>,

    /// Dot-separated path to the text field in JSON files, e.g. "content.text"
    #[arg(long)]
    pub json_path: Option<String>,

    /// Only process the first N files (sorted by name)
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Show how files would be packed without writing anything
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Continue from the resume record left by an earlier run
    #[arg(long, default_value_t = false)]
    pub resume: bool,

    /// Delete the resume record once the run completes
    #[arg(long, default_value_t = false)]
    pub clear_resume: bool,

    /// Number of files extracted concurrently
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// TOML file with default settings
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Settings accepted in the TOML config file. All optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub word_limit: Option<u64>,
    pub source_limit: Option<u32>,
    pub plus_plan: Option<bool>,
    pub extensions: Option<Vec<String>>,
    pub json_path: Option<String>,
    pub max_files: Option<usize>,
    pub concurrency: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

impl Args {
    /// Build the run configuration from defaults, the config file and flags.
    pub fn to_pack_config(&self) -> Result<PackConfig> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let mut config = PackConfig::new(&self.input_dir, &self.output_dir);

        if let Some(words) = file.word_limit {
            config.word_limit = words;
        }
        if file.plus_plan == Some(true) {
            config.source_limit = PLUS_SOURCE_LIMIT;
        }
        if let Some(limit) = file.source_limit {
            config.source_limit = limit;
        }
        if let Some(exts) = &file.extensions {
            config.extensions = parse_extensions(&exts.join(","))?;
        }
        if file.json_path.is_some() {
            config.json_path = file.json_path.clone();
        }
        if file.max_files.is_some() {
            config.max_files = file.max_files;
        }
        if let Some(n) = file.concurrency {
            config.extract_concurrency = n;
        }

        if let Some(words) = self.word_limit {
            config.word_limit = words;
        }
        if self.plus_plan {
            config.source_limit = PLUS_SOURCE_LIMIT;
        }
        if let Some(limit) = self.limit {
            config.source_limit = limit;
        }
        if let Some(exts) = &self.extensions {
            config.extensions = parse_extensions(exts)?;
        }
        if self.json_path.is_some() {
            config.json_path = self.json_path.clone();
        }
        if self.max_files.is_some() {
            config.max_files = self.max_files;
        }
        if let Some(n) = self.concurrency {
            config.extract_concurrency = n;
        }

        config.dry_run = self.dry_run;
        config.resume = self.resume;
        config.clear_resume_on_success = self.clear_resume;

        config.validate()?;
        Ok(config)
    }
}
