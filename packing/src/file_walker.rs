//! File Walker
//!
//! Deterministic discovery of packable files using the `ignore` crate

use crate::config::DocumentKind;
use crate::error::{PackError, PackResult};
use crate::types::InputFile;
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lists candidate files directly inside an input directory.
pub struct FileWalker {
    root: PathBuf,
}

impl FileWalker {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Return the files whose extension is in `allowed`, sorted by relative
    /// path, then truncated to `max_files`.
    ///
    /// Hidden files (the resume marker among them) are never returned.
    pub fn enumerate(
        &self,
        allowed: &BTreeSet<DocumentKind>,
        max_files: Option<usize>,
    ) -> PackResult<Vec<InputFile>> {
        let meta = std::fs::metadata(&self.root).map_err(|e| PackError::from_io(&self.root, e))?;
        if !meta.is_dir() {
            return Err(PackError::not_found(&self.root));
        }
        // Surface an unreadable root here; the walker would swallow it.
        std::fs::read_dir(&self.root).map_err(|e| PackError::from_io(&self.root, e))?;

        let root = self
            .root
            .canonicalize()
            .map_err(|e| PackError::from_io(&self.root, e))?;

        let walker = WalkBuilder::new(&root)
            .max_depth(Some(1))
            .hidden(true)
            .git_ignore(false)
            .git_exclude(false)
            .git_global(false)
            .ignore(false)
            .parents(false)
            .build();

        let mut files = Vec::new();
        for entry in walker.flatten() {
            let path = entry.path();
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let Some(kind) = path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(DocumentKind::from_extension)
            else {
                continue;
            };
            if !allowed.contains(&kind) {
                continue;
            }
            let relative = match path.strip_prefix(&root) {
                Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };
            files.push(InputFile {
                path: path.to_path_buf(),
                relative,
                kind,
            });
        }

        files.sort_by(|a, b| a.relative.cmp(&b.relative));
        if let Some(max) = max_files {
            files.truncate(max);
        }

        debug!(root = %root.display(), count = files.len(), "Enumerated input files");
        Ok(files)
    }
}
