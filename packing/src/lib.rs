//! Packing library for Notebook Cat
//!
//! Combines a directory of text, Markdown and JSON files into as few
//! NotebookLM sources as possible, under two hard limits:
//! - a word limit per source (480,000 by default)
//! - a source limit per notebook (50 on the free plan, 300 on Plus)
//!
//! # Pipeline
//!
//! 1. [`file_walker::FileWalker`] lists candidate files in a stable order
//! 2. [`extract::TextExtractor`] turns each file into text and a word count
//! 3. [`bin_packer::Packer`] assigns files to buckets, first-fit, in order
//! 4. [`resume::ResumeTracker`] records every assignment durably
//! 5. [`report`] writes `notebooklm_source_NNN.txt` files and a summary
//!
//! [`pipeline::run`] drives all five for a [`config::PackConfig`].
//!
//! # Usage
//!
//! ```no_run
//! # async fn demo() -> packing::PackResult<()> {
//! let mut config = packing::PackConfig::new("transcripts", "sources");
//! config.resume = true;
//! let report = packing::run(&config).await?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod bin_packer;
pub mod config;
pub mod error;
pub mod extract;
pub mod file_walker;
pub mod pipeline;
pub mod report;
pub mod resume;
pub mod types;

pub use bin_packer::{pack, Assignment, AssignmentSink, NoopSink, PackLimits, PackOutcome, Packer};
pub use config::{
    parse_extensions, DocumentKind, PackConfig, DEFAULT_SOURCE_LIMIT, DEFAULT_WORD_LIMIT,
    PLUS_SOURCE_LIMIT, RESUME_MARKER_FILE,
};
pub use error::{PackError, PackErrorKind, PackResult};
pub use extract::{extract_all, TextExtractor, JSON_TEXT_FIELDS};
pub use file_walker::FileWalker;
pub use pipeline::run;
pub use report::{
    source_file_name, write_summary, RunReport, SourceWriter, SOURCE_FILE_PREFIX,
    SUMMARY_FILE_NAME,
};
pub use resume::{
    clear_resume_record, load_resume_record, RecordedAssignment, ResumeRecord, ResumeTracker,
};
pub use types::{count_words, Bucket, ExtractedFile, Extraction, InputFile, PackedMember, SkippedFile};
