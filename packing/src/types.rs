//! Shared file and bucket types.

use crate::config::DocumentKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A candidate file found by the enumerator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Path relative to the input directory, `/`-separated. Stable key for
    /// reports and the resume record.
    pub relative: String,
    pub kind: DocumentKind,
}

/// A file whose text has been extracted. Read-only once built.
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    pub file: InputFile,
    pub text: String,
    pub word_count: u64,
}

/// A file that could not be packed because extraction failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub file: InputFile,
    pub reason: String,
}

/// Extraction result for one file, in enumeration order.
pub type Extraction = Result<ExtractedFile, SkippedFile>;

/// A bucket member as exposed to reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedMember {
    pub relative: String,
    pub path: PathBuf,
    pub word_count: u64,
}

impl From<&ExtractedFile> for PackedMember {
    fn from(extracted: &ExtractedFile) -> Self {
        Self {
            relative: extracted.file.relative.clone(),
            path: extracted.file.path.clone(),
            word_count: extracted.word_count,
        }
    }
}

/// One output grouping of packed files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Sequence number, starting at 1.
    pub seq: u32,
    /// Members added in this run, in packing order.
    pub members: Vec<PackedMember>,
    /// Running total, including `carried_words`.
    pub word_total: u64,
    /// Words already in this bucket from a previous (resumed) run.
    pub carried_words: u64,
    /// Holds a single file larger than the word limit.
    pub oversized: bool,
}

impl Bucket {
    pub fn new(seq: u32) -> Self {
        Self {
            seq,
            members: Vec::new(),
            word_total: 0,
            carried_words: 0,
            oversized: false,
        }
    }

    /// A bucket reopened from the resume record.
    pub fn carried(seq: u32, word_total: u64) -> Self {
        Self {
            word_total,
            carried_words: word_total,
            ..Self::new(seq)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_carried(&self) -> bool {
        self.carried_words > 0
    }

    pub(crate) fn push(&mut self, member: PackedMember) {
        self.word_total += member.word_count;
        self.members.push(member);
    }
}

/// Whitespace-delimited token count.
pub fn count_words(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   \n\t "), 0);
        assert_eq!(count_words("one two\nthree\tfour  five"), 5);
    }

    #[test]
    fn test_bucket_push_tracks_total() {
        let mut bucket = Bucket::carried(3, 60);
        assert!(bucket.is_carried());
        assert!(bucket.is_empty());
        bucket.push(PackedMember {
            relative: "c.txt".into(),
            path: PathBuf::from("/in/c.txt"),
            word_count: 30,
        });
        assert_eq!(bucket.word_total, 90);
        assert_eq!(bucket.carried_words, 60);
        assert_eq!(bucket.members.len(), 1);
    }
}
