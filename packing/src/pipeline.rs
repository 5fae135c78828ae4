//! Pipeline
//!
//! Enumerate, extract, pack, and report for one input directory.

use crate::bin_packer::{pack, Assignment, AssignmentSink, NoopSink, PackLimits, PackOutcome};
use crate::config::PackConfig;
use crate::error::{PackError, PackResult};
use crate::extract::{extract_all, TextExtractor};
use crate::file_walker::FileWalker;
use crate::report::{source_file_name, write_summary, RunReport, SourceWriter};
use crate::resume::{clear_resume_record, ResumeRecord, ResumeTracker};
use crate::types::{Bucket, InputFile};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Writes each assignment's section, then records it together with the
/// output file's new length.
struct OutputSink {
    writer: SourceWriter,
    tracker: ResumeTracker,
}

impl AssignmentSink for OutputSink {
    fn assigned(&mut self, assignment: &Assignment<'_>) -> PackResult<()> {
        let bytes = self.writer.append(assignment)?;
        self.tracker.record(
            &assignment.file.file.relative,
            assignment.seq,
            assignment.file.word_count,
            assignment.oversized,
            Some(bytes),
        )
    }
}

/// Run one packing pass as described by `config`.
///
/// Fatal errors (missing input, source limit, write failures) are returned;
/// per-file extraction failures and corrupt resume state end up in the
/// report instead.
pub async fn run(config: &PackConfig) -> PackResult<RunReport> {
    config.validate()?;

    let files = FileWalker::new(&config.input_dir).enumerate(&config.extensions, config.max_files)?;
    info!(
        input = %config.input_dir.display(),
        files = files.len(),
        word_limit = config.word_limit,
        source_limit = config.source_limit,
        dry_run = config.dry_run,
        resume = config.resume,
        "Starting packing run"
    );

    let resume_path = config.resume_path();
    let mut warnings = Vec::new();

    let record = if config.resume {
        load_valid_record(&resume_path, &config.input_dir, &mut warnings)?
    } else {
        None
    };
    if record.is_none() && !config.dry_run {
        clear_resume_record(&resume_path)?;
    }

    let (pending, already_packed) = split_already_packed(files, record.as_ref());
    if already_packed > 0 {
        info!(already_packed, pending = pending.len(), "Skipping files recorded by an earlier run");
    }

    let extractor = Arc::new(TextExtractor::new(config.json_path.clone()));
    let items = extract_all(extractor, pending, config.extract_concurrency).await;

    let mut output = if config.dry_run {
        None
    } else {
        let writer = SourceWriter::new(&config.output_dir)?;
        if let Some(existing) = &record {
            if let Some(bytes) = existing.last_bucket_bytes.filter(|_| existing.last_bucket > 0) {
                let seq = existing.last_bucket;
                let removed = writer.discard_unrecorded(seq, bytes)?;
                if removed > 0 {
                    warnings.push(format!(
                        "removed {removed} unrecorded byte(s) from {} left by an interrupted run",
                        source_file_name(seq)
                    ));
                }
            }
        }
        let tracker = match &record {
            Some(existing) => ResumeTracker::with_record(&resume_path, existing.clone()),
            None => ResumeTracker::new(&resume_path),
        };
        Some(OutputSink { writer, tracker })
    };

    let limits = PackLimits::from(config);
    let outcome = match output.as_mut() {
        Some(sink) => pack(items, limits, record.as_ref(), sink)?,
        None => pack(items, limits, record.as_ref(), &mut NoopSink)?,
    };

    warnings.extend(oversized_warnings(&outcome, limits));

    let sources = final_sources(record.as_ref(), &config.input_dir, &outcome.buckets);
    let mut report = RunReport {
        input_dir: config.input_dir.clone(),
        output_dir: config.output_dir.clone(),
        limits,
        dry_run: config.dry_run,
        resumed: record.is_some(),
        total_sources: sources.last().map_or(0, |b| b.seq),
        sources,
        buckets: outcome.buckets,
        skipped: outcome.skipped,
        oversized: outcome.oversized,
        already_packed,
        warnings,
        outputs: output
            .as_ref()
            .map(|sink| sink.writer.written_paths())
            .unwrap_or_default(),
        summary_path: None,
    };

    if let Some(sink) = output.as_mut() {
        sink.writer.remove_stale_sources(report.total_sources)?;
        report.summary_path = Some(write_summary(&report, &config.output_dir)?);
        if config.clear_resume_on_success {
            sink.tracker.clear()?;
        }
    }

    info!(
        packed = report.packed_count(),
        sources = report.buckets.len(),
        total_sources = report.total_sources,
        skipped = report.skipped.len(),
        oversized = report.oversized.len(),
        "Packing run finished"
    );
    Ok(report)
}

/// Load the resume record, downgrading non-fatal problems to a warning.
fn load_valid_record(
    path: &Path,
    input_dir: &Path,
    warnings: &mut Vec<String>,
) -> PackResult<Option<ResumeRecord>> {
    let loaded = ResumeTracker::load(path).and_then(|record| match record {
        Some(record) => record
            .validate(input_dir)
            .map(|()| Some(record))
            .map_err(|reason| PackError::resume_corrupt(path, reason)),
        None => Ok(None),
    });

    match loaded {
        Ok(Some(record)) => {
            info!(
                files = record.assignments.len(),
                last_bucket = record.last_bucket,
                last_bucket_words = record.last_bucket_words,
                "Loaded resume state"
            );
            Ok(Some(record))
        }
        Ok(None) => {
            info!("No resume state found; starting fresh");
            Ok(None)
        }
        Err(e) if !e.is_fatal() => {
            warn!(error = %e, "Ignoring resume state");
            warnings.push(format!("{e}; starting fresh"));
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Earlier buckets from `record` with this run's buckets merged in.
fn final_sources(record: Option<&ResumeRecord>, input_dir: &Path, current: &[Bucket]) -> Vec<Bucket> {
    let mut sources = record.map(|r| r.buckets(input_dir)).unwrap_or_default();
    for bucket in current {
        match sources.iter_mut().find(|s| s.seq == bucket.seq) {
            Some(existing) => {
                existing.oversized |= bucket.oversized;
                for member in &bucket.members {
                    existing.push(member.clone());
                }
            }
            None => sources.push(bucket.clone()),
        }
    }
    sources
}

/// Drop files the record already covers, returning how many were dropped.
fn split_already_packed(
    files: Vec<InputFile>,
    record: Option<&ResumeRecord>,
) -> (Vec<InputFile>, usize) {
    let Some(record) = record else {
        return (files, 0);
    };
    let total = files.len();
    let pending: Vec<InputFile> = files
        .into_iter()
        .filter(|f| !record.is_packed(&f.relative))
        .collect();
    let dropped = total - pending.len();
    (pending, dropped)
}

fn oversized_warnings(outcome: &PackOutcome, limits: PackLimits) -> Vec<String> {
    outcome
        .buckets
        .iter()
        .filter(|b| b.oversized)
        .flat_map(|b| {
            b.members.iter().map(move |m| {
                format!(
                    "{} has {} words, over the {} word limit; placed alone in source {}",
                    m.relative, m.word_count, limits.word_limit, b.seq
                )
            })
        })
        .collect()
}
