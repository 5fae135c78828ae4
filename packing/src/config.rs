//! Run configuration
//!
//! Limits, input filters and run mode.
//!
//! A `PackConfig` is built once and passed explicitly into the pipeline,
//! so independent runs (tests included) never share state.

use crate::error::{PackError, PackResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Maximum word count per source file (includes a 20k word cushion).
pub const DEFAULT_WORD_LIMIT: u64 = 480_000;

/// Source count limit on the free plan.
pub const DEFAULT_SOURCE_LIMIT: u32 = 50;

/// Source count limit on the Plus plan.
pub const PLUS_SOURCE_LIMIT: u32 = 300;

/// Hidden marker in the input directory that holds the resume record.
pub const RESUME_MARKER_FILE: &str = ".notebook_cat_resume";

/// Declared document type, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Text,
    Markdown,
    Json,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [Self::Text, Self::Markdown, Self::Json];

    /// Match an extension (without the dot), case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(Self::Text),
            "md" => Some(Self::Markdown),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Parse a comma-separated extension list such as `"txt,md"`.
pub fn parse_extensions(list: &str) -> PackResult<BTreeSet<DocumentKind>> {
    let mut kinds = BTreeSet::new();
    for raw in list.split(',') {
        let ext = raw.trim().trim_start_matches('.');
        if ext.is_empty() {
            continue;
        }
        let kind = DocumentKind::from_extension(ext).ok_or_else(|| {
            PackError::invalid_config(format!(
                "unsupported extension '{ext}' (expected txt, md or json)"
            ))
        })?;
        kinds.insert(kind);
    }
    if kinds.is_empty() {
        return Err(PackError::invalid_config("no file extensions selected"));
    }
    Ok(kinds)
}

/// Configuration for a single packing run.
#[derive(Debug, Clone)]
pub struct PackConfig {
    /// Directory holding the files to pack.
    pub input_dir: PathBuf,
    /// Directory receiving `notebooklm_source_NNN.txt` and the summary.
    pub output_dir: PathBuf,
    /// Maximum words per bucket.
    pub word_limit: u64,
    /// Maximum number of buckets.
    pub source_limit: u32,
    /// Extensions considered during enumeration.
    pub extensions: BTreeSet<DocumentKind>,
    /// Dot-separated path to the text field in JSON documents.
    pub json_path: Option<String>,
    /// Compute the assignment only; write nothing.
    pub dry_run: bool,
    /// Continue from the resume record in the input directory.
    pub resume: bool,
    /// Keep only the first N files after ordering.
    pub max_files: Option<usize>,
    /// Number of files extracted concurrently.
    pub extract_concurrency: usize,
    /// Remove the resume record once the run completes successfully.
    pub clear_resume_on_success: bool,
}

impl Default for PackConfig {
    fn default() -> Self {
        fn from_env<T: std::str::FromStr + PartialOrd + Default>(var: &str, default: T) -> T {
            std::env::var(var)
                .ok()
                .and_then(|v| v.parse::<T>().ok())
                .filter(|v| *v > T::default())
                .unwrap_or(default)
        }

        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("output"),
            word_limit: from_env("NOTEBOOK_CAT_WORD_LIMIT", DEFAULT_WORD_LIMIT),
            source_limit: from_env("NOTEBOOK_CAT_SOURCE_LIMIT", DEFAULT_SOURCE_LIMIT),
            extensions: DocumentKind::ALL.into_iter().collect(),
            json_path: None,
            dry_run: false,
            resume: false,
            max_files: None,
            extract_concurrency: from_env("NOTEBOOK_CAT_CONCURRENCY", cpus),
            clear_resume_on_success: false,
        }
    }
}

impl PackConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Location of the resume record for this input directory.
    pub fn resume_path(&self) -> PathBuf {
        self.input_dir.join(RESUME_MARKER_FILE)
    }

    /// Validate the configuration before any file is touched.
    pub fn validate(&self) -> PackResult<()> {
        if self.word_limit == 0 {
            return Err(PackError::invalid_config("word limit must be positive"));
        }
        if self.source_limit == 0 {
            return Err(PackError::invalid_config("source limit must be positive"));
        }
        if self.extensions.is_empty() {
            return Err(PackError::invalid_config("no file extensions selected"));
        }
        if self.max_files == Some(0) {
            return Err(PackError::invalid_config("max files must be positive"));
        }
        if let Some(path) = &self.json_path {
            if path.trim().is_empty() || path.split('.').any(str::is_empty) {
                return Err(PackError::invalid_config(format!(
                    "malformed JSON field path '{path}'"
                )));
            }
        }
        Ok(())
    }
}
