//! Analysis outcome

use serde::{Serialize, Serializer};
use std::time::Duration;

use crate::errors::AnalyzerError;
use crate::features::leak_trace::LeakTrace;

/// Retained heap attributed to the leaking instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetainedSize {
    /// Retained size computation was disabled
    Skipped,
    Bytes(u64),
}

impl RetainedSize {
    pub fn bytes(&self) -> Option<u64> {
        match self {
            RetainedSize::Skipped => None,
            RetainedSize::Bytes(bytes) => Some(*bytes),
        }
    }
}

fn serialize_error<S: Serializer>(error: &AnalyzerError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Result of one leak check; errors are carried as `Failure`
#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AnalysisResult {
    /// The reference was cleared, or nothing strongly reaches it
    NoLeak {
        class_name: String,
        analysis_duration_ms: u64,
    },
    LeakFound {
        /// The path needed an excluded reference
        excluded_leak: bool,
        class_name: String,
        leak_trace: LeakTrace,
        retained_heap_size: RetainedSize,
        analysis_duration_ms: u64,
    },
    Failure {
        #[serde(serialize_with = "serialize_error")]
        error: AnalyzerError,
        analysis_duration_ms: u64,
    },
}

impl AnalysisResult {
    pub fn no_leak(class_name: impl Into<String>, duration: Duration) -> Self {
        AnalysisResult::NoLeak {
            class_name: class_name.into(),
            analysis_duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn leak_detected(
        excluded_leak: bool,
        class_name: impl Into<String>,
        leak_trace: LeakTrace,
        retained_heap_size: RetainedSize,
        duration: Duration,
    ) -> Self {
        AnalysisResult::LeakFound {
            excluded_leak,
            class_name: class_name.into(),
            leak_trace,
            retained_heap_size,
            analysis_duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn failure(error: AnalyzerError, duration: Duration) -> Self {
        AnalysisResult::Failure {
            error,
            analysis_duration_ms: duration.as_millis() as u64,
        }
    }

    /// A leak was found that no exclusion explains
    pub fn is_leak(&self) -> bool {
        matches!(
            self,
            AnalysisResult::LeakFound {
                excluded_leak: false,
                ..
            }
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, AnalysisResult::Failure { .. })
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            AnalysisResult::NoLeak { class_name, .. }
            | AnalysisResult::LeakFound { class_name, .. } => Some(class_name),
            AnalysisResult::Failure { .. } => None,
        }
    }

    pub fn leak_trace(&self) -> Option<&LeakTrace> {
        match self {
            AnalysisResult::LeakFound { leak_trace, .. } => Some(leak_trace),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AnalyzerError> {
        match self {
            AnalysisResult::Failure { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn analysis_duration_ms(&self) -> u64 {
        match self {
            AnalysisResult::NoLeak {
                analysis_duration_ms,
                ..
            }
            | AnalysisResult::LeakFound {
                analysis_duration_ms,
                ..
            }
            | AnalysisResult::Failure {
                analysis_duration_ms,
                ..
            } => *analysis_duration_ms,
        }
    }
}
