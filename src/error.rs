//! Error types for report rendering and persistence.

use std::path::PathBuf;

use thiserror::Error;

/// A character the active font has no encoding for.
///
/// Never reaches the caller: the wrapper drops the offending token and the
/// sanitizer strips anything outside printable ASCII before measurement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot encode {ch:?} in {text:?}")]
pub struct EncodingError {
    pub ch: char,
    pub text: String,
}

/// Fatal errors while laying out or serializing a document.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Caller-side configuration bug (empty schema, page too small, ...).
    #[error("layout invariant violated: {0}")]
    LayoutInvariantViolation(String),

    /// Font could not be loaded or parsed.
    #[error("font error: {0}")]
    Font(String),

    /// PDF backend failure.
    #[error("pdf error: {0}")]
    Pdf(String),
}

/// Machine-readable persist failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum PersistErrorKind {
    WriteFailed,
    DirectoryCreateFailed,
}

/// Terminal errors for one persist attempt. Retrying the whole persist call is safe.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PersistError {
    pub fn kind(&self) -> PersistErrorKind {
        match self {
            PersistError::WriteFailed { .. } => PersistErrorKind::WriteFailed,
            PersistError::DirectoryCreateFailed { .. } => PersistErrorKind::DirectoryCreateFailed,
        }
    }

    /// Whether retrying the whole persist call can succeed without caller changes.
    pub fn is_retryable(&self) -> bool {
        match self {
            PersistError::WriteFailed { .. } => true,
            PersistError::DirectoryCreateFailed { source, .. } => {
                source.kind() != std::io::ErrorKind::PermissionDenied
            }
        }
    }

    /// Underlying OS message, suitable for a "try again" prompt.
    pub fn detail(&self) -> String {
        match self {
            PersistError::WriteFailed { source, .. }
            | PersistError::DirectoryCreateFailed { source, .. } => source.to_string(),
        }
    }
}

/// Errors from the one-call render + persist pipeline.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Errors loading a [`crate::RendererConfig`] from disk or JSON.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors parsing a report date.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid report date {input:?}: expected YYYY-MM-DD")]
pub struct DateParseError {
    pub input: String,
}
