//! Source Writer
//!
//! Materializes assignments as NotebookLM source files.

use crate::bin_packer::Assignment;
use crate::error::{PackError, PackResult};
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Output file name prefix, shared with the summary.
pub const SOURCE_FILE_PREFIX: &str = "notebooklm_source_";

/// `notebooklm_source_007.txt` for bucket 7.
pub fn source_file_name(seq: u32) -> String {
    format!("{SOURCE_FILE_PREFIX}{seq:03}.txt")
}

/// Inverse of [`source_file_name`].
fn source_seq(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(SOURCE_FILE_PREFIX)?
        .strip_suffix(".txt")?
        .parse()
        .ok()
}

/// Header line written above each member's text.
pub fn section_header(relative: &str) -> String {
    format!("### Source: {relative}")
}

/// Appends each packed file's text to its bucket's output file.
///
/// A bucket opened in this run is truncated on its first member; a bucket
/// carried over from a resumed run is appended to.
pub struct SourceWriter {
    output_dir: PathBuf,
    written: BTreeSet<u32>,
}

impl SourceWriter {
    /// Create the writer, creating `output_dir` if needed.
    pub fn new(output_dir: impl AsRef<Path>) -> PackResult<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir).map_err(|e| PackError::from_io(&output_dir, e))?;
        Ok(Self {
            output_dir,
            written: BTreeSet::new(),
        })
    }

    pub fn source_path(&self, seq: u32) -> PathBuf {
        self.output_dir.join(source_file_name(seq))
    }

    /// Output files touched so far, in sequence order.
    pub fn written_paths(&self) -> Vec<PathBuf> {
        self.written.iter().map(|seq| self.source_path(*seq)).collect()
    }

    /// Write the assigned file's section and return the output file's new
    /// length in bytes.
    pub fn append(&mut self, assignment: &Assignment<'_>) -> PackResult<u64> {
        let path = self.source_path(assignment.seq);
        let mut options = OpenOptions::new();
        if assignment.opened {
            options.write(true).create(true).truncate(true);
        } else {
            options.append(true).create(true);
        }
        let mut file = options
            .open(&path)
            .map_err(|e| PackError::from_io(&path, e))?;

        let existing = file.metadata()?.len();
        let mut section = String::with_capacity(assignment.file.text.len() + 64);
        if existing > 0 {
            section.push_str("\n\n");
        }
        section.push_str(&section_header(&assignment.file.file.relative));
        section.push_str("\n\n");
        section.push_str(assignment.file.text.trim_end());
        section.push('\n');

        file.write_all(section.as_bytes())?;
        file.sync_data()?;

        self.written.insert(assignment.seq);
        debug!(path = %path.display(), file = %assignment.file.file.relative, "Wrote section");
        Ok(existing + section.len() as u64)
    }

    /// Cut bucket `seq`'s output back to `recorded_len` bytes, dropping
    /// sections written after the last recorded assignment. Returns the
    /// number of bytes removed.
    pub fn discard_unrecorded(&self, seq: u32, recorded_len: u64) -> PackResult<u64> {
        let path = self.source_path(seq);
        let file = match OpenOptions::new().write(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Resumed source file is missing");
                return Ok(0);
            }
            Err(e) => return Err(PackError::from_io(&path, e)),
        };

        let len = file.metadata()?.len();
        if len <= recorded_len {
            return Ok(0);
        }
        file.set_len(recorded_len)?;
        file.sync_data()?;
        let removed = len - recorded_len;
        warn!(
            path = %path.display(),
            bytes = removed,
            "Removed unrecorded output from an interrupted run"
        );
        Ok(removed)
    }

    /// Delete source files numbered above `last_seq` left by earlier runs.
    pub fn remove_stale_sources(&self, last_seq: u32) -> PackResult<Vec<PathBuf>> {
        let mut removed = Vec::new();
        let entries =
            std::fs::read_dir(&self.output_dir).map_err(|e| PackError::from_io(&self.output_dir, e))?;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(seq) = name.to_str().and_then(source_seq) else {
                continue;
            };
            if seq > last_seq && entry.file_type()?.is_file() {
                std::fs::remove_file(entry.path())?;
                removed.push(entry.path());
            }
        }
        removed.sort();
        if !removed.is_empty() {
            info!(count = removed.len(), last_seq, "Removed stale source files");
        }
        Ok(removed)
    }
}
