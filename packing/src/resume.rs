//! Resume Tracker
//!
//! Durable record of which file went into which bucket.
//!
//! The record is rewritten atomically (temp file, fsync, rename) after
//! every assignment, so a killed run leaves either the previous or the
//! new record on disk, never a torn one.

use crate::error::{PackError, PackResult};
use crate::types::{Bucket, PackedMember};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Current on-disk format version.
pub const RESUME_FORMAT_VERSION: u32 = 2;

/// Where one packed file went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedAssignment {
    pub bucket: u32,
    pub words: u64,
    /// Position in overall packing order, counted across runs.
    pub position: usize,
    #[serde(default)]
    pub oversized: bool,
}

/// Persisted mapping of packed files to bucket sequence numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub version: u32,
    /// Relative input path → assignment.
    pub assignments: BTreeMap<String, RecordedAssignment>,
    /// Sequence number of the last (possibly still open) bucket; 0 if none.
    pub last_bucket: u32,
    /// Word total of the last bucket at the time of the last assignment.
    pub last_bucket_words: u64,
    /// Length in bytes of the last bucket's output file after its last
    /// recorded section. Anything beyond it was never recorded.
    #[serde(default)]
    pub last_bucket_bytes: Option<u64>,
    pub updated_at: DateTime<Utc>,
}

impl Default for ResumeRecord {
    fn default() -> Self {
        Self {
            version: RESUME_FORMAT_VERSION,
            assignments: BTreeMap::new(),
            last_bucket: 0,
            last_bucket_words: 0,
            last_bucket_bytes: None,
            updated_at: Utc::now(),
        }
    }
}

impl ResumeRecord {
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn is_packed(&self, relative: &str) -> bool {
        self.assignments.contains_key(relative)
    }

    pub fn bucket_of(&self, relative: &str) -> Option<u32> {
        self.assignments.get(relative).map(|a| a.bucket)
    }

    /// Add `relative` to `bucket`, keeping the last-bucket fields in step.
    ///
    /// Does not check for an existing assignment; [`ResumeTracker::record`]
    /// does.
    pub fn assign(&mut self, relative: &str, bucket: u32, words: u64, oversized: bool) {
        let position = self.assignments.len();
        self.assignments.insert(
            relative.to_string(),
            RecordedAssignment {
                bucket,
                words,
                position,
                oversized,
            },
        );
        if bucket == self.last_bucket {
            self.last_bucket_words += words;
        } else {
            self.last_bucket = bucket;
            self.last_bucket_words = words;
            self.last_bucket_bytes = None;
        }
        self.updated_at = Utc::now();
    }

    /// Rebuild the recorded buckets in sequence order, members in packing
    /// order. Every word counts as carried.
    pub fn buckets(&self, input_dir: &Path) -> Vec<Bucket> {
        let mut by_seq: BTreeMap<u32, Vec<(&String, &RecordedAssignment)>> = BTreeMap::new();
        for (relative, assignment) in &self.assignments {
            by_seq
                .entry(assignment.bucket)
                .or_default()
                .push((relative, assignment));
        }

        by_seq
            .into_iter()
            .map(|(seq, mut members)| {
                members.sort_by_key(|(_, a)| a.position);
                let mut bucket = Bucket::new(seq);
                for (relative, assignment) in members {
                    bucket.oversized |= assignment.oversized;
                    bucket.push(PackedMember {
                        relative: relative.clone(),
                        path: input_dir.join(relative),
                        word_count: assignment.words,
                    });
                }
                bucket.carried_words = bucket.word_total;
                bucket
            })
            .collect()
    }

    /// Check internal consistency and that every recorded file still exists
    /// under `input_dir`.
    pub fn validate(&self, input_dir: &Path) -> Result<(), String> {
        if self.version != RESUME_FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {})",
                self.version, RESUME_FORMAT_VERSION
            ));
        }

        if self.assignments.values().any(|a| a.bucket == 0) {
            return Err("bucket sequence numbers start at 1".to_string());
        }
        let max_seq = self.assignments.values().map(|a| a.bucket).max().unwrap_or(0);
        if max_seq != self.last_bucket {
            return Err(format!(
                "last bucket {} does not match highest assigned bucket {}",
                self.last_bucket, max_seq
            ));
        }
        let last_words: u64 = self
            .assignments
            .values()
            .filter(|a| a.bucket == self.last_bucket)
            .map(|a| a.words)
            .sum();
        if last_words != self.last_bucket_words {
            return Err(format!(
                "bucket {} records {} words but its files hold {}",
                self.last_bucket, self.last_bucket_words, last_words
            ));
        }

        for relative in self.assignments.keys() {
            if !input_dir.join(relative).is_file() {
                return Err(format!("recorded file '{relative}' is no longer present"));
            }
        }
        Ok(())
    }
}

/// Load a resume record.
///
/// A missing file is `Ok(None)` and an unparseable one is
/// `ResumeStateCorrupt`. A record the user may not read is
/// `PermissionDenied`.
pub fn load_resume_record(path: &Path) -> PackResult<Option<ResumeRecord>> {
    if !path.exists() {
        return Ok(None);
    }

    let json = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => PackError::permission_denied(path),
        _ => PackError::resume_corrupt(path, format!("unreadable: {e}")),
    })?;
    let record: ResumeRecord = serde_json::from_str(&json)
        .map_err(|e| PackError::resume_corrupt(path, format!("invalid JSON: {e}")))?;
    Ok(Some(record))
}

/// Delete a persisted resume record
pub fn clear_resume_record(path: &Path) -> PackResult<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
        info!(path = %path.display(), "Cleared resume state");
    }
    Ok(())
}

/// Owns the in-memory record and keeps the on-disk copy in step with it.
pub struct ResumeTracker {
    path: PathBuf,
    record: ResumeRecord,
}

impl ResumeTracker {
    /// Start with an empty record at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_record(path, ResumeRecord::default())
    }

    /// Continue from a previously loaded record.
    pub fn with_record(path: impl AsRef<Path>, record: ResumeRecord) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            record,
        }
    }

    /// Load the record at `path`, or `None` if there is none.
    pub fn load(path: impl AsRef<Path>) -> PackResult<Option<ResumeRecord>> {
        load_resume_record(path.as_ref())
    }

    pub fn record_state(&self) -> &ResumeRecord {
        &self.record
    }

    /// Note that `relative` (`words` words) went into bucket `seq` and
    /// persist before returning. `output_bytes` is the bucket's output file
    /// length once the file's section is written.
    pub fn record(
        &mut self,
        relative: &str,
        seq: u32,
        words: u64,
        oversized: bool,
        output_bytes: Option<u64>,
    ) -> PackResult<()> {
        if let Some(existing) = self.record.bucket_of(relative) {
            return Err(PackError::resume_corrupt(
                &self.path,
                format!("'{relative}' is already assigned to bucket {existing}"),
            ));
        }

        self.record.assign(relative, seq, words, oversized);
        self.record.last_bucket_bytes = output_bytes;
        self.persist()?;

        debug!(
            file = relative,
            bucket = seq,
            words = self.record.last_bucket_words,
            "Recorded assignment"
        );
        Ok(())
    }

    /// Remove the on-disk record and reset the in-memory one.
    pub fn clear(&mut self) -> PackResult<()> {
        self.record = ResumeRecord::default();
        clear_resume_record(&self.path)
    }

    /// Write to a temp file, fsync, then rename over the record.
    fn persist(&self) -> PackResult<()> {
        let temp_path = self.path.with_extension("tmp");
        let content = serde_json::to_string_pretty(&self.record)?;

        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}
