//! Assignment sinks
//!
//! Observers notified synchronously as files are packed.

use crate::error::PackResult;
use crate::types::ExtractedFile;

/// A single packing decision.
#[derive(Debug, Clone, Copy)]
pub struct Assignment<'a> {
    pub file: &'a ExtractedFile,
    /// Bucket sequence number the file went into.
    pub seq: u32,
    /// Bucket word total after the file was added.
    pub bucket_words: u64,
    /// First member of a bucket opened in this run.
    pub opened: bool,
    /// The file exceeds the word limit and sits alone in its bucket.
    pub oversized: bool,
}

/// Receives every assignment before the packer moves to the next file.
///
/// An error aborts packing; the assignment it was called for counts as
/// not done.
pub trait AssignmentSink {
    fn assigned(&mut self, assignment: &Assignment<'_>) -> PackResult<()>;
}

/// Discards assignments (dry runs, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl AssignmentSink for NoopSink {
    fn assigned(&mut self, _assignment: &Assignment<'_>) -> PackResult<()> {
        Ok(())
    }
}
