//! Report Builder
//!
//! Source files and the run summary.

pub mod summary;
pub mod writer;

pub use summary::{write_summary, RunReport, SUMMARY_FILE_NAME};
pub use writer::{source_file_name, SourceWriter, SOURCE_FILE_PREFIX};
