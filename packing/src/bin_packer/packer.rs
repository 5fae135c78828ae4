//! Packer
//!
//! Single-pass, order-preserving first-fit bucket assignment.
//!
//! Files are taken strictly in enumeration order. Each one either joins the
//! current bucket, opens the next bucket, or (when larger than the word
//! limit on its own) gets a dedicated oversized bucket. Opening a bucket
//! past the source limit stops the run with `SourceLimitExceeded`.

use crate::bin_packer::sink::{Assignment, AssignmentSink};
use crate::config::PackConfig;
use crate::error::{PackError, PackResult};
use crate::resume::ResumeRecord;
use crate::types::{Bucket, ExtractedFile, Extraction, PackedMember, SkippedFile};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// The two numeric limits the packer enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackLimits {
    pub word_limit: u64,
    pub source_limit: u32,
}

impl PackLimits {
    pub fn new(word_limit: u64, source_limit: u32) -> Self {
        Self {
            word_limit,
            source_limit,
        }
    }
}

impl From<&PackConfig> for PackLimits {
    fn from(config: &PackConfig) -> Self {
        Self::new(config.word_limit, config.source_limit)
    }
}

/// Result of one packing pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackOutcome {
    /// Buckets that received files in this pass, in sequence order.
    pub buckets: Vec<Bucket>,
    /// Files dropped because extraction failed.
    pub skipped: Vec<SkippedFile>,
    /// Files placed alone in a bucket because they exceed the word limit.
    pub oversized: Vec<PackedMember>,
}

impl PackOutcome {
    /// Number of files assigned in this pass.
    pub fn packed_count(&self) -> usize {
        self.buckets.iter().map(|b| b.members.len()).sum()
    }

    /// All packed members, bucket by bucket, in packing order.
    pub fn members_in_order(&self) -> impl Iterator<Item = &PackedMember> {
        self.buckets.iter().flat_map(|b| b.members.iter())
    }

    /// Highest bucket sequence number touched, if any.
    pub fn last_seq(&self) -> Option<u32> {
        self.buckets.last().map(|b| b.seq)
    }
}

/// Stateful first-fit packer. Consumed by [`Packer::pack`].
pub struct Packer {
    limits: PackLimits,
    current: Option<Bucket>,
    last_seq: u32,
    packed: usize,
    outcome: PackOutcome,
}

impl Packer {
    /// Start fresh at bucket 1.
    pub fn new(limits: PackLimits) -> Self {
        Self {
            limits,
            current: None,
            last_seq: 0,
            packed: 0,
            outcome: PackOutcome::default(),
        }
    }

    /// Continue from a resume record: the record's last bucket becomes the
    /// current bucket, pre-filled with its recorded word total.
    pub fn resume_from(limits: PackLimits, record: &ResumeRecord) -> Self {
        let mut packer = Self::new(limits);
        if record.last_bucket > 0 {
            packer.last_seq = record.last_bucket;
            packer.current = Some(Bucket::carried(
                record.last_bucket,
                record.last_bucket_words,
            ));
        }
        packer
    }

    /// Pack `items` in order, reporting every assignment to `sink`.
    pub fn pack<S: AssignmentSink>(
        mut self,
        items: Vec<Extraction>,
        sink: &mut S,
    ) -> PackResult<PackOutcome> {
        let mut remaining = items.iter().filter(|item| item.is_ok()).count();

        for item in items {
            match item {
                Ok(file) => {
                    self.place(&file, remaining, sink)?;
                    remaining -= 1;
                }
                Err(skipped) => self.outcome.skipped.push(skipped),
            }
        }

        if let Some(bucket) = self.current.take() {
            self.finish(bucket);
        }

        info!(
            buckets = self.outcome.buckets.len(),
            packed = self.packed,
            skipped = self.outcome.skipped.len(),
            oversized = self.outcome.oversized.len(),
            "Packing complete"
        );
        Ok(self.outcome)
    }

    fn place<S: AssignmentSink>(
        &mut self,
        file: &ExtractedFile,
        remaining: usize,
        sink: &mut S,
    ) -> PackResult<()> {
        let words = file.word_count;

        if words > self.limits.word_limit {
            if let Some(bucket) = self.current.take() {
                self.finish(bucket);
            }
            let seq = self.open_seq(remaining)?;
            let mut bucket = Bucket::new(seq);
            bucket.oversized = true;
            bucket.push(PackedMember::from(file));

            warn!(
                file = %file.file.relative,
                words,
                word_limit = self.limits.word_limit,
                bucket = seq,
                "File exceeds the word limit; placing it in its own source"
            );
            sink.assigned(&Assignment {
                file,
                seq,
                bucket_words: bucket.word_total,
                opened: true,
                oversized: true,
            })?;

            self.packed += 1;
            self.outcome.oversized.push(PackedMember::from(file));
            self.outcome.buckets.push(bucket);
            return Ok(());
        }

        let mut bucket = match self.current.take() {
            Some(bucket) if bucket.word_total + words <= self.limits.word_limit => bucket,
            previous => {
                if let Some(full) = previous {
                    self.finish(full);
                }
                Bucket::new(self.open_seq(remaining)?)
            }
        };

        let opened = bucket.is_empty() && !bucket.is_carried();
        bucket.push(PackedMember::from(file));
        let assignment = Assignment {
            file,
            seq: bucket.seq,
            bucket_words: bucket.word_total,
            opened,
            oversized: false,
        };
        debug!(
            file = %file.file.relative,
            words,
            bucket = bucket.seq,
            bucket_words = bucket.word_total,
            "Assigned"
        );
        let seq = bucket.seq;
        self.current = Some(bucket);
        if let Err(e) = sink.assigned(&assignment) {
            // Undo the in-memory append; the sink never saw it succeed.
            if let Some(bucket) = self.current.as_mut().filter(|b| b.seq == seq) {
                if let Some(member) = bucket.members.pop() {
                    bucket.word_total -= member.word_count;
                }
            }
            return Err(e);
        }

        self.packed += 1;
        Ok(())
    }

    /// Allocate the next sequence number, enforcing the source limit.
    fn open_seq(&mut self, remaining: usize) -> PackResult<u32> {
        let seq = self.last_seq + 1;
        if seq > self.limits.source_limit {
            warn!(
                source_limit = self.limits.source_limit,
                remaining,
                packed = self.packed,
                "Source limit reached"
            );
            return Err(PackError::SourceLimitExceeded {
                limit: self.limits.source_limit,
                remaining,
                packed: self.packed,
            });
        }
        self.last_seq = seq;
        Ok(seq)
    }

    fn finish(&mut self, bucket: Bucket) {
        if bucket.is_empty() {
            return;
        }
        debug!(
            bucket = bucket.seq,
            files = bucket.members.len(),
            words = bucket.word_total,
            "Bucket finalized"
        );
        self.outcome.buckets.push(bucket);
    }
}

/// Pack `items` under `limits`, continuing from `resume` when given.
pub fn pack<S: AssignmentSink>(
    items: Vec<Extraction>,
    limits: PackLimits,
    resume: Option<&ResumeRecord>,
    sink: &mut S,
) -> PackResult<PackOutcome> {
    let packer = match resume {
        Some(record) => Packer::resume_from(limits, record),
        None => Packer::new(limits),
    };
    packer.pack(items, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bin_packer::sink::NoopSink;
    use crate::config::DocumentKind;
    use crate::types::InputFile;
    use std::path::PathBuf;

    fn file(name: &str, words: u64) -> Extraction {
        Ok(ExtractedFile {
            file: InputFile {
                path: PathBuf::from("/in").join(name),
                relative: name.to_string(),
                kind: DocumentKind::Text,
            },
            text: "w ".repeat(words as usize),
            word_count: words,
        })
    }

    fn names(bucket: &Bucket) -> Vec<&str> {
        bucket.members.iter().map(|m| m.relative.as_str()).collect()
    }

    #[derive(Default)]
    struct Recording(Vec<(String, u32, u64, bool)>);

    impl AssignmentSink for Recording {
        fn assigned(&mut self, a: &Assignment<'_>) -> PackResult<()> {
            self.0
                .push((a.file.file.relative.clone(), a.seq, a.bucket_words, a.opened));
            Ok(())
        }
    }

    #[test]
    fn test_scenario_a_source_limit_exceeded() {
        let items = vec![file("1.txt", 40), file("2.txt", 70), file("3.txt", 50)];
        let mut sink = Recording::default();
        let err = pack(items, PackLimits::new(100, 2), None, &mut sink).unwrap_err();

        match err {
            PackError::SourceLimitExceeded {
                limit,
                remaining,
                packed,
            } => {
                assert_eq!(limit, 2);
                assert_eq!(remaining, 1);
                assert_eq!(packed, 2);
            }
            other => panic!("expected SourceLimitExceeded, got {other:?}"),
        }
        // Progress before the stop was reported
        assert_eq!(sink.0.len(), 2);
        assert_eq!(sink.0[1], ("2.txt".to_string(), 2, 70, true));
    }

    #[test]
    fn test_scenario_b_single_bucket() {
        let items = vec![file("1.txt", 30), file("2.txt", 40), file("3.txt", 20)];
        let outcome = pack(items, PackLimits::new(100, 5), None, &mut NoopSink).unwrap();
        assert_eq!(outcome.buckets.len(), 1);
        assert_eq!(outcome.buckets[0].seq, 1);
        assert_eq!(outcome.buckets[0].word_total, 90);
        assert_eq!(names(&outcome.buckets[0]), vec!["1.txt", "2.txt", "3.txt"]);
    }

    #[test]
    fn test_scenario_c_oversized_gets_own_bucket() {
        let items = vec![file("small.txt", 20), file("huge.txt", 150), file("tail.txt", 10)];
        let outcome = pack(items, PackLimits::new(100, 5), None, &mut NoopSink).unwrap();

        assert_eq!(outcome.buckets.len(), 3);
        assert_eq!(names(&outcome.buckets[0]), vec!["small.txt"]);
        assert!(outcome.buckets[1].oversized);
        assert_eq!(outcome.buckets[1].word_total, 150);
        assert_eq!(names(&outcome.buckets[2]), vec!["tail.txt"]);
        assert_eq!(outcome.oversized.len(), 1);
        assert_eq!(outcome.oversized[0].relative, "huge.txt");
    }

    #[test]
    fn test_exact_fit_stays_in_bucket() {
        let items = vec![file("a.txt", 60), file("b.txt", 40), file("c.txt", 1)];
        let outcome = pack(items, PackLimits::new(100, 5), None, &mut NoopSink).unwrap();
        assert_eq!(outcome.buckets.len(), 2);
        assert_eq!(outcome.buckets[0].word_total, 100);
        assert_eq!(names(&outcome.buckets[1]), vec!["c.txt"]);
    }

    #[test]
    fn test_skipped_files_do_not_consume_buckets() {
        let skipped = Err(SkippedFile {
            file: InputFile {
                path: PathBuf::from("/in/bad.json"),
                relative: "bad.json".into(),
                kind: DocumentKind::Json,
            },
            reason: "malformed JSON".into(),
        });
        let items = vec![file("a.txt", 10), skipped, file("b.txt", 10)];
        let outcome = pack(items, PackLimits::new(100, 1), None, &mut NoopSink).unwrap();
        assert_eq!(outcome.buckets.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].file.relative, "bad.json");
    }

    #[test]
    fn test_scenario_e_resume_opens_next_bucket() {
        let mut record = ResumeRecord::default();
        record.assign("a.txt", 1, 30, false);
        record.assign("b.txt", 1, 30, false);

        let mut sink = Recording::default();
        let outcome = pack(
            vec![file("c.txt", 50)],
            PackLimits::new(100, 5),
            Some(&record),
            &mut sink,
        )
        .unwrap();

        assert_eq!(outcome.buckets.len(), 1);
        assert_eq!(outcome.buckets[0].seq, 2);
        assert_eq!(sink.0, vec![("c.txt".to_string(), 2, 50, true)]);
    }

    #[test]
    fn test_resume_appends_to_open_bucket() {
        let mut record = ResumeRecord::default();
        record.assign("a.txt", 1, 60, false);

        let mut sink = Recording::default();
        let outcome = pack(
            vec![file("c.txt", 40)],
            PackLimits::new(100, 5),
            Some(&record),
            &mut sink,
        )
        .unwrap();

        let bucket = &outcome.buckets[0];
        assert_eq!(bucket.seq, 1);
        assert_eq!(bucket.word_total, 100);
        assert_eq!(bucket.carried_words, 60);
        // Appending to a carried bucket is not an "open"
        assert_eq!(sink.0, vec![("c.txt".to_string(), 1, 100, false)]);
    }

    #[test]
    fn test_resume_counts_toward_source_limit() {
        let mut record = ResumeRecord::default();
        record.assign("a.txt", 1, 70, false);
        record.assign("b.txt", 2, 90, false);

        let err = pack(
            vec![file("c.txt", 50)],
            PackLimits::new(100, 2),
            Some(&record),
            &mut NoopSink,
        )
        .unwrap_err();
        assert!(matches!(err, PackError::SourceLimitExceeded { remaining: 1, .. }));
    }

    #[test]
    fn test_sink_failure_aborts() {
        struct FailSecond(usize);
        impl AssignmentSink for FailSecond {
            fn assigned(&mut self, _a: &Assignment<'_>) -> PackResult<()> {
                self.0 += 1;
                if self.0 == 2 {
                    return Err(PackError::Io(std::io::Error::other("disk full")));
                }
                Ok(())
            }
        }

        let items = vec![file("a.txt", 1), file("b.txt", 1), file("c.txt", 1)];
        let err = pack(items, PackLimits::new(100, 5), None, &mut FailSecond(0)).unwrap_err();
        assert!(matches!(err, PackError::Io(_)));
    }

    #[test]
    fn test_order_preserved_and_limit_respected() {
        let sizes = [17u64, 83, 5, 99, 100, 1, 42, 58, 33, 67, 250, 12];
        let items: Vec<Extraction> = sizes
            .iter()
            .enumerate()
            .map(|(i, w)| file(&format!("{i:02}.txt"), *w))
            .collect();
        let outcome = pack(items, PackLimits::new(100, 50), None, &mut NoopSink).unwrap();

        let order: Vec<String> = outcome.members_in_order().map(|m| m.relative.clone()).collect();
        let expected: Vec<String> = (0..sizes.len()).map(|i| format!("{i:02}.txt")).collect();
        assert_eq!(order, expected);

        for (i, bucket) in outcome.buckets.iter().enumerate() {
            assert_eq!(bucket.seq, i as u32 + 1);
            let sum: u64 = bucket.members.iter().map(|m| m.word_count).sum();
            assert_eq!(sum, bucket.word_total);
            if !bucket.oversized {
                assert!(bucket.word_total <= 100);
            } else {
                assert_eq!(bucket.members.len(), 1);
            }
        }
    }
}
