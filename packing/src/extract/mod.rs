//! Text Extractor
//!
//! Turns text, Markdown and JSON files into packable text.
//!
//! Extraction is a pure function of file content and declared type.
//! `extract_all` runs it on blocking worker threads and hands results back
//! in enumeration order.

pub mod json;

use crate::config::DocumentKind;
use crate::error::{PackError, PackResult};
use crate::types::{count_words, ExtractedFile, Extraction, InputFile, SkippedFile};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

pub use json::JSON_TEXT_FIELDS;

/// Extracts text according to the document kind.
#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    json_path: Option<String>,
}

impl TextExtractor {
    pub fn new(json_path: Option<String>) -> Self {
        Self { json_path }
    }

    /// Read `file` and return its text and word count.
    ///
    /// Fails with `PackError::Extraction` for unreadable files, invalid
    /// UTF-8, malformed JSON, unresolvable fields, or content with no words.
    pub fn extract(&self, file: &InputFile) -> PackResult<ExtractedFile> {
        let bytes = std::fs::read(&file.path).map_err(|e| {
            let reason = match e.kind() {
                std::io::ErrorKind::PermissionDenied => "permission denied".to_string(),
                _ => format!("read failed: {e}"),
            };
            PackError::extraction(&file.path, reason)
        })?;

        let raw = String::from_utf8(bytes)
            .map_err(|e| PackError::extraction(&file.path, format!("not valid UTF-8: {e}")))?;
        let raw = normalize(&raw);

        let text = match file.kind {
            DocumentKind::Text | DocumentKind::Markdown => raw,
            DocumentKind::Json => self.extract_json(file, &raw)?,
        };

        let word_count = count_words(&text);
        if word_count == 0 {
            return Err(PackError::extraction(&file.path, "no text content"));
        }

        Ok(ExtractedFile {
            file: file.clone(),
            text,
            word_count,
        })
    }

    fn extract_json(&self, file: &InputFile, raw: &str) -> PackResult<String> {
        let doc: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| PackError::extraction(&file.path, format!("malformed JSON: {e}")))?;

        match &self.json_path {
            Some(path) => json::text_at_path(&doc, path)
                .map_err(|reason| PackError::extraction(&file.path, reason)),
            None => json::find_known_text(&doc).map(str::to_string).ok_or_else(|| {
                PackError::extraction(
                    &file.path,
                    format!(
                        "no string field among [{}] found",
                        JSON_TEXT_FIELDS.join(", ")
                    ),
                )
            }),
        }
    }
}

/// Strip a UTF-8 BOM and normalize CRLF line endings.
fn normalize(raw: &str) -> String {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    if raw.contains("\r\n") {
        raw.replace("\r\n", "\n")
    } else {
        raw.to_string()
    }
}

/// Extract every file with up to `concurrency` blocking tasks in flight.
///
/// Results come back in the order of `files`; failures become
/// `SkippedFile` entries rather than errors.
pub async fn extract_all(
    extractor: Arc<TextExtractor>,
    files: Vec<InputFile>,
    concurrency: usize,
) -> Vec<Extraction> {
    stream::iter(files)
        .map(|file| {
            let extractor = Arc::clone(&extractor);
            async move {
                let task_file = file.clone();
                let joined =
                    tokio::task::spawn_blocking(move || extractor.extract(&task_file)).await;
                match joined {
                    Ok(Ok(extracted)) => {
                        debug!(
                            file = %extracted.file.relative,
                            words = extracted.word_count,
                            "Extracted"
                        );
                        Ok(extracted)
                    }
                    Ok(Err(e)) => {
                        let reason = match e {
                            PackError::Extraction { reason, .. } => reason,
                            other => other.to_string(),
                        };
                        warn!(file = %file.relative, %reason, "Skipping file");
                        Err(SkippedFile { file, reason })
                    }
                    Err(join_err) => {
                        let reason = format!("extraction task failed: {join_err}");
                        warn!(file = %file.relative, %reason, "Skipping file");
                        Err(SkippedFile { file, reason })
                    }
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}
