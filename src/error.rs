//! Centralized error types for html2eml.

use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::Stage;

/// All fatal errors produced while converting a document.
///
/// Anything in here aborts the current batch. Problems with individual
/// resources are reported through [`ResolveError`] instead and never escape
/// the pipeline.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified input file does not exist.
    #[error("HTML file not found: {0}")]
    FileNotFound(PathBuf),

    /// The markup could not be rewritten.
    #[error("Cannot process HTML of '{path}' while {stage}: {reason}")]
    Html {
        path: PathBuf,
        stage: Stage,
        reason: String,
    },

    /// The message could not be encoded.
    #[error("Cannot generate email for '{path}': {source}")]
    Assemble {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The output file could not be written.
    #[error("Cannot write '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Nothing to convert.
    #[error("no .html files given")]
    NoInputs,

    /// A file in a batch failed; wraps the underlying cause.
    #[error("parse {path} failed: {source}")]
    Failed {
        path: PathBuf,
        source: Box<ConvertError>,
    },
}

/// Convenience alias for `Result<T, ConvertError>`.
pub type Result<T> = std::result::Result<T, ConvertError>;

impl ConvertError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an `Html` variant for a rewriting failure during `stage`.
    pub fn html(path: impl Into<PathBuf>, stage: Stage, reason: impl ToString) -> Self {
        Self::Html {
            path: path.into(),
            stage,
            reason: reason.to_string(),
        }
    }
}

/// Recoverable failures while resolving a single resource reference.
///
/// These are logged and the originating attribute is left untouched.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A remote reference is not a usable URL.
    #[error("cannot parse reference {reference}: {source}")]
    InvalidUrl {
        reference: String,
        source: url::ParseError,
    },

    /// A data URI could not be decoded.
    #[error("cannot decode {reference}: {reason}")]
    DataUri { reference: String, reason: String },

    /// No candidate location for a local reference could be read.
    #[error("{reference} does not match any embedded part")]
    DanglingContentId { reference: String },

    #[error("cannot attach {reference}: {source}")]
    LocalFile {
        reference: String,
        source: std::io::Error,
    },
}
