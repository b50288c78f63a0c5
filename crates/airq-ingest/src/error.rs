//! Error types for sensor data ingestion.

use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::PipelineState;

/// Errors raised by the decoder and the batching pipeline.
///
/// Consumer failures are not represented here: a run returns the consumer's
/// own error untouched.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Source Errors ===
    /// The input could not be opened, or its header row could not be read.
    #[error("failed to open source {path}: {source}")]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A read failed after streaming had started.
    #[error("read failed at line {line}: {source}")]
    SourceIo {
        line: u64,
        #[source]
        source: std::io::Error,
    },

    /// The reader rejected the input structure.
    #[error("malformed input at line {line}: {message}")]
    Decode { line: u64, message: String },

    // === Configuration Errors ===
    /// Options failed validation before the source was opened.
    #[error("invalid ingest options: {reason}")]
    InvalidOptions { reason: String },

    // === Pipeline Errors ===
    /// `run` was called on a pipeline that is no longer idle.
    #[error("pipeline cannot run from state {state}")]
    PipelineReused { state: PipelineState },
}

impl IngestError {
    /// Converts a `csv` error raised mid-stream into a decode-time error.
    pub(crate) fn from_csv(err: csv::Error) -> Self {
        let line = err.position().map_or(0, csv::Position::line);
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(source) => Self::SourceIo { line, source },
            _ => Self::Decode { line, message },
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
