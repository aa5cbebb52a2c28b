//! Analysis progress reporting

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Analysis stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalyzerStep {
    ReadingHeapDumpFile,
    ParsingHeapDump,
    DeduplicatingGcRoots,
    FindingLeakingRef,
    FindingShortestPath,
    BuildingLeakTrace,
    ComputingDominators,
    ComputingBitmapSize,
}

impl AnalyzerStep {
    pub const ALL: [AnalyzerStep; 8] = [
        AnalyzerStep::ReadingHeapDumpFile,
        AnalyzerStep::ParsingHeapDump,
        AnalyzerStep::DeduplicatingGcRoots,
        AnalyzerStep::FindingLeakingRef,
        AnalyzerStep::FindingShortestPath,
        AnalyzerStep::BuildingLeakTrace,
        AnalyzerStep::ComputingDominators,
        AnalyzerStep::ComputingBitmapSize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzerStep::ReadingHeapDumpFile => "READING_HEAP_DUMP_FILE",
            AnalyzerStep::ParsingHeapDump => "PARSING_HEAP_DUMP",
            AnalyzerStep::DeduplicatingGcRoots => "DEDUPLICATING_GC_ROOTS",
            AnalyzerStep::FindingLeakingRef => "FINDING_LEAKING_REF",
            AnalyzerStep::FindingShortestPath => "FINDING_SHORTEST_PATH",
            AnalyzerStep::BuildingLeakTrace => "BUILDING_LEAK_TRACE",
            AnalyzerStep::ComputingDominators => "COMPUTING_DOMINATORS",
            AnalyzerStep::ComputingBitmapSize => "COMPUTING_BITMAP_SIZE",
        }
    }

    /// Rough completion percentage once this step starts
    pub fn percent(&self) -> u32 {
        let position = Self::ALL.iter().position(|s| s == self).unwrap_or(0) as u32;
        (position + 1) * 100 / Self::ALL.len() as u32
    }
}

impl fmt::Display for AnalyzerStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives a callback as each stage starts
pub trait ProgressListener: Send + Sync {
    fn on_progress_update(&self, step: AnalyzerStep);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgressListener;

impl ProgressListener for NoopProgressListener {
    fn on_progress_update(&self, _step: AnalyzerStep) {}
}

/// Logs each stage at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingProgressListener;

impl ProgressListener for LoggingProgressListener {
    fn on_progress_update(&self, step: AnalyzerStep) {
        info!(
            "Analysis in progress, working on: {} ({}%)",
            step,
            step.percent()
        );
    }
}

/// Forward `step` to `listener`, logging instead of propagating a panic
pub(crate) fn notify(listener: &dyn ProgressListener, step: AnalyzerStep) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener.on_progress_update(step))) {
        warn!(
            "Progress listener panicked on {}: {}",
            step,
            panic_message(payload.as_ref())
        );
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
