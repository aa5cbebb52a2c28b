//! Error types for leakgraph-analyzer
//!
//! Every variant ends up inside `AnalysisResult::Failure`; the analyzer never
//! lets one escape `check_for_leak`.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::shared::models::ObjectId;

/// Main error type for analysis operations
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Heap dump file does not exist
    #[error("File does not exist: {}", .0.display())]
    SnapshotNotFound(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Snapshot decoded but is internally inconsistent
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// The tag record class is not present in the heap dump
    #[error("Could not find the {0} class in the heap dump.")]
    MissingMarkerClass(String),

    /// No tag record carries the requested key
    #[error("Could not find weak reference with key {key} in {found:?}")]
    MissingTagRecord {
        key: String,
        found: Vec<Option<String>>,
    },

    /// A string instance whose backing storage is not a char or byte array
    #[error("Could not find char array in {0}")]
    UnsupportedString(ObjectId),

    /// Unexpected graph shape during traversal
    #[error("Traversal error: {0}")]
    Traversal(String),

    /// A panic caught at the analysis boundary
    #[error("Analysis panicked: {0}")]
    Panic(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AnalyzerError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        AnalyzerError::Parse(msg.into())
    }

    /// Create an invalid snapshot error
    pub fn invalid_snapshot(msg: impl Into<String>) -> Self {
        AnalyzerError::InvalidSnapshot(msg.into())
    }

    /// Create a traversal error
    pub fn traversal(msg: impl Into<String>) -> Self {
        AnalyzerError::Traversal(msg.into())
    }
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(err: serde_json::Error) -> Self {
        AnalyzerError::Parse(err.to_string())
    }
}

/// Result type alias for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;
