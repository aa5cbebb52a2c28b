/*
 * leakgraph - Heap-Graph Leak Analyzer
 *
 * Given a heap snapshot and the key of a watched object, explains why the
 * object is still alive: the shortest strong path from a GC root, labeled
 * with exclusions and expected reachability, plus its retained size.
 *
 * Feature-First Architecture:
 * - shared/   : Heap graph model (objects, roots, value rendering)
 * - features/ : One slice per stage (root dedup → locator → path → trace → reachability → retained size)
 * - snapshot/ : Snapshot sources
 * - pipeline/ : HeapAnalyzer orchestration, progress, results
 * - config/   : YAML configuration and presets
 */

#![allow(clippy::should_implement_trait)] // Preset::from_str returns ConfigResult

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Heap graph model and constants
pub mod shared;

/// Analysis stages
pub mod features;

/// Snapshot loading
pub mod snapshot;

/// Pipeline orchestration
pub mod pipeline;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{AnalyzerConfig, ConfigError, Preset};
pub use errors::{AnalyzerError, Result};
pub use features::exclusions::{ExcludedRefs, ExcludedRefsBuilder, Exclusion, ExclusionRule};
pub use features::leak_locator::TrackedReference;
pub use features::leak_trace::{
    ClassMetadata, Holder, LeakReference, LeakTrace, LeakTraceElement, ReferenceKind,
};
pub use features::reachability::{Reachability, ReachabilityInspector};
pub use pipeline::{
    AnalysisOptions, AnalysisResult, AnalyzerStep, HeapAnalyzer, LoggingProgressListener,
    ProgressListener, RetainedSize,
};
pub use shared::models::{GcRoot, HeapGraph, HeapSnapshot, ObjectId, RootKind};
pub use snapshot::{JsonSnapshotSource, SnapshotSource};
