//! Packing error types
//!
//! Fatal errors abort a run and carry enough detail for the caller to
//! suggest a remedy. Per-file failures (`Extraction`) and resume-state
//! problems (`ResumeStateCorrupt`) are accumulated into the run report
//! instead of interrupting packing.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for packing operations
pub type PackResult<T> = Result<T, PackError>;

/// Machine-readable error classification, used by callers to pick exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackErrorKind {
    NotFound,
    PermissionDenied,
    Extraction,
    SourceLimitExceeded,
    ResumeStateCorrupt,
    InvalidConfig,
    Io,
}

impl std::fmt::Display for PackErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::PermissionDenied => write!(f, "permission_denied"),
            Self::Extraction => write!(f, "extraction"),
            Self::SourceLimitExceeded => write!(f, "source_limit_exceeded"),
            Self::ResumeStateCorrupt => write!(f, "resume_state_corrupt"),
            Self::InvalidConfig => write!(f, "invalid_config"),
            Self::Io => write!(f, "io"),
        }
    }
}

/// Errors that can occur while enumerating, extracting, or packing files
#[derive(Error, Debug)]
pub enum PackError {
    /// Input directory does not exist
    #[error("Input directory not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// Input directory (or a file) cannot be read
    #[error("Permission denied: {}", .path.display())]
    PermissionDenied { path: PathBuf },

    /// A single file could not be turned into text
    #[error("Cannot extract text from {}: {reason}", .path.display())]
    Extraction { path: PathBuf, reason: String },

    /// Packing needs more buckets than the source limit allows
    #[error(
        "Source limit of {limit} exceeded: {remaining} file(s) remain unpacked \
         after {packed} were assigned"
    )]
    SourceLimitExceeded {
        limit: u32,
        remaining: usize,
        packed: usize,
    },

    /// Persisted resume record is unreadable or inconsistent
    #[error("Resume state at {} is corrupt: {reason}", .path.display())]
    ResumeStateCorrupt { path: PathBuf, reason: String },

    /// Configuration rejected before any work started
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PackError {
    /// Create a not found error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a permission denied error
    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied { path: path.into() }
    }

    /// Create an extraction error
    pub fn extraction(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Extraction {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a corrupt resume state error
    pub fn resume_corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ResumeStateCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Map an IO error on `path` to the matching error kind.
    ///
    /// `NotFound` and `PermissionDenied` keep the path; everything else
    /// becomes a plain IO error.
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::Io(err),
        }
    }

    pub fn kind(&self) -> PackErrorKind {
        match self {
            Self::NotFound { .. } => PackErrorKind::NotFound,
            Self::PermissionDenied { .. } => PackErrorKind::PermissionDenied,
            Self::Extraction { .. } => PackErrorKind::Extraction,
            Self::SourceLimitExceeded { .. } => PackErrorKind::SourceLimitExceeded,
            Self::ResumeStateCorrupt { .. } => PackErrorKind::ResumeStateCorrupt,
            Self::InvalidConfig { .. } => PackErrorKind::InvalidConfig,
            Self::Io(_) | Self::Json(_) => PackErrorKind::Io,
        }
    }

    /// Whether this error aborts the run when raised at run level.
    ///
    /// Extraction failures and corrupt resume state are recovered from
    /// by the pipeline.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::Extraction { .. } | Self::ResumeStateCorrupt { .. }
        )
    }

    /// Get recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => {
                Some("Check the input directory path and make sure it exists.")
            }
            Self::PermissionDenied { .. } => Some(
                "Make sure the current user can read the input directory and \
                 write the output directory.",
            ),
            Self::Extraction { .. } => Some(
                "The file was skipped. For JSON input, check --json-path against \
                 the document structure.",
            ),
            Self::SourceLimitExceeded { .. } => Some(
                "Raise the source limit (--limit or --plus-plan), raise --word-limit, \
                 or prune the input, then rerun with --resume to continue where \
                 packing stopped.",
            ),
            Self::ResumeStateCorrupt { .. } => Some(
                "The resume record was ignored and packing started fresh. Delete \
                 .notebook_cat_resume in the input directory to silence this warning.",
            ),
            Self::InvalidConfig { .. } => Some(
                "Limits must be positive and extensions must be a subset of txt, md, json.",
            ),
            Self::Io(_) | Self::Json(_) => None,
        }
    }
}
