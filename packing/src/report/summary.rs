//! Run report and the human-readable summary file.

use crate::bin_packer::PackLimits;
use crate::error::PackResult;
use crate::report::writer::source_file_name;
use crate::types::{Bucket, PackedMember, SkippedFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Summary file written next to the sources.
pub const SUMMARY_FILE_NAME: &str = "notebook_cat_summary.txt";

/// Everything a caller needs to report on a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub limits: PackLimits,
    pub dry_run: bool,
    pub resumed: bool,
    /// Buckets that received files in this run.
    pub buckets: Vec<Bucket>,
    /// Final assignment across this and earlier runs, in sequence order.
    /// Words from earlier runs are counted in `carried_words`.
    pub sources: Vec<Bucket>,
    pub skipped: Vec<SkippedFile>,
    pub oversized: Vec<PackedMember>,
    /// Files left out because the resume record already covers them.
    pub already_packed: usize,
    /// Highest bucket sequence number across this and earlier runs.
    pub total_sources: u32,
    pub warnings: Vec<String>,
    /// Source files written or extended in this run.
    pub outputs: Vec<PathBuf>,
    pub summary_path: Option<PathBuf>,
}

impl RunReport {
    pub fn packed_count(&self) -> usize {
        self.buckets.iter().map(|b| b.members.len()).sum()
    }

    /// Words added in this run.
    pub fn packed_words(&self) -> u64 {
        self.buckets
            .iter()
            .map(|b| b.word_total - b.carried_words)
            .sum()
    }

    /// Files in the final assignment.
    pub fn total_files(&self) -> usize {
        self.sources.iter().map(|b| b.members.len()).sum()
    }

    /// Render the summary text.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, out: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(out, "Notebook Cat summary")?;
        writeln!(out, "====================")?;
        writeln!(out, "Input directory: {}", self.input_dir.display())?;
        writeln!(out, "Output directory: {}", self.output_dir.display())?;
        writeln!(
            out,
            "Limits: {} words per source, {} sources",
            self.limits.word_limit, self.limits.source_limit
        )?;
        if self.dry_run {
            writeln!(out, "Mode: dry run (no files written)")?;
        }
        if self.resumed {
            writeln!(
                out,
                "Resumed: {} file(s) already packed by an earlier run",
                self.already_packed
            )?;
        }
        writeln!(
            out,
            "This run: packed {} file(s), {} words, into {} source(s)",
            self.packed_count(),
            self.packed_words(),
            self.buckets.len()
        )?;
        writeln!(
            out,
            "Total: {} file(s) in {} source(s) ({} of {} used)",
            self.total_files(),
            self.sources.len(),
            self.total_sources,
            self.limits.source_limit
        )?;

        for bucket in &self.sources {
            writeln!(out)?;
            write!(
                out,
                "{}: {} words, {} file(s)",
                source_file_name(bucket.seq),
                bucket.word_total,
                bucket.members.len()
            )?;
            if bucket.carried_words == bucket.word_total {
                write!(out, " (earlier run)")?;
            } else if bucket.carried_words > 0 {
                write!(out, " (continues {} earlier words)", bucket.carried_words)?;
            }
            if bucket.oversized {
                write!(out, " [OVERSIZED]")?;
            }
            writeln!(out)?;
            for member in &bucket.members {
                writeln!(out, "  - {} ({} words)", member.relative, member.word_count)?;
            }
        }

        if !self.oversized.is_empty() {
            writeln!(out)?;
            writeln!(
                out,
                "Oversized files (exceed {} words, placed alone):",
                self.limits.word_limit
            )?;
            for member in &self.oversized {
                writeln!(out, "  - {} ({} words)", member.relative, member.word_count)?;
            }
        }

        if !self.skipped.is_empty() {
            writeln!(out)?;
            writeln!(out, "Skipped files:")?;
            for skipped in &self.skipped {
                writeln!(out, "  - {}: {}", skipped.file.relative, skipped.reason)?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(out)?;
            writeln!(out, "Warnings:")?;
            for warning in &self.warnings {
                writeln!(out, "  - {warning}")?;
            }
        }
        Ok(())
    }
}

/// Write the summary into `output_dir`, returning its path.
pub fn write_summary(report: &RunReport, output_dir: &Path) -> PackResult<PathBuf> {
    let path = output_dir.join(SUMMARY_FILE_NAME);
    std::fs::write(&path, report.render())?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocumentKind;
    use crate::types::InputFile;

    fn member(name: &str, words: u64) -> PackedMember {
        PackedMember {
            relative: name.to_string(),
            path: PathBuf::from("/in").join(name),
            word_count: words,
        }
    }

    fn sample() -> RunReport {
        let mut first = Bucket::carried(1, 60);
        first.push(member("c.txt", 30));
        let mut second = Bucket::new(2);
        second.oversized = true;
        second.push(member("huge.txt", 150));

        let mut earlier = Bucket::new(1);
        earlier.push(member("a.txt", 25));
        earlier.push(member("b.txt", 35));
        earlier.carried_words = earlier.word_total;
        earlier.push(member("c.txt", 30));

        RunReport {
            input_dir: PathBuf::from("/in"),
            output_dir: PathBuf::from("/out"),
            limits: PackLimits::new(100, 5),
            dry_run: false,
            resumed: true,
            buckets: vec![first, second.clone()],
            sources: vec![earlier, second],
            skipped: vec![SkippedFile {
                file: InputFile {
                    path: PathBuf::from("/in/bad.json"),
                    relative: "bad.json".into(),
                    kind: DocumentKind::Json,
                },
                reason: "malformed JSON".into(),
            }],
            oversized: vec![member("huge.txt", 150)],
            already_packed: 2,
            total_sources: 2,
            warnings: vec!["huge.txt exceeds the word limit".into()],
            outputs: Vec::new(),
            summary_path: None,
        }
    }

    #[test]
    fn test_counts() {
        let report = sample();
        assert_eq!(report.packed_count(), 2);
        assert_eq!(report.packed_words(), 180);
        assert_eq!(report.total_files(), 4);
    }

    #[test]
    fn test_render_mentions_everything() {
        let text = sample().render();
        assert!(text.contains(
            "notebooklm_source_001.txt: 90 words, 3 file(s) (continues 60 earlier words)"
        ));
        assert!(text.contains("  - a.txt (25 words)"));
        assert!(text.contains("Total: 4 file(s) in 2 source(s) (2 of 5 used)"));
        assert!(text.contains("[OVERSIZED]"));
        assert!(text.contains("bad.json: malformed JSON"));
        assert!(text.contains("Resumed: 2 file(s)"));
        assert!(text.contains("Warnings:"));
    }

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_summary(&sample(), dir.path()).unwrap();
        assert!(path.ends_with(SUMMARY_FILE_NAME));
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("Notebook Cat summary"));
    }
}
