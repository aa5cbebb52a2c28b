//! Leak check pipeline
//!
//! Read → dedup roots → locate tag record → shortest path → leak trace →
//! (dominators → bitmap correction). Every failure, including a panic in
//! any stage, comes back as `AnalysisResult::Failure`.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use super::progress::{notify, panic_message, AnalyzerStep, NoopProgressListener, ProgressListener};
use super::result::{AnalysisResult, RetainedSize};
use crate::config::AnalyzerConfig;
use crate::errors::{AnalyzerError, Result};
use crate::features::exclusions::ExcludedRefs;
use crate::features::leak_locator::{find_leaking_reference, find_tracked_references, TrackedReference};
use crate::features::leak_trace::{ClassMetadata, LeakTraceBuilder, NoClassMetadata};
use crate::features::reachability::ReachabilityInspector;
use crate::features::retained_size::compute_ignored_bitmap_retained_size;
use crate::features::root_dedup::deduplicate_gc_roots;
use crate::features::shortest_path::ShortestPathFinder;
use crate::shared::constants::{BITMAP_BUFFER_FIELD, BITMAP_CLASS, KEYED_WEAK_REFERENCE_CLASS};
use crate::shared::models::HeapGraph;
use crate::snapshot::{JsonSnapshotSource, SnapshotSource};

/// Class names the pipeline looks up in the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub marker_class: String,
    /// Add bitmaps held through native roots to the retained size
    pub bitmap_correction: bool,
    pub bitmap_class: String,
    pub bitmap_buffer_field: String,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            marker_class: KEYED_WEAK_REFERENCE_CLASS.to_string(),
            bitmap_correction: true,
            bitmap_class: BITMAP_CLASS.to_string(),
            bitmap_buffer_field: BITMAP_BUFFER_FIELD.to_string(),
        }
    }
}

pub struct HeapAnalyzer {
    excluded_refs: ExcludedRefs,
    inspectors: Vec<Box<dyn ReachabilityInspector>>,
    class_metadata: Box<dyn ClassMetadata>,
    listener: Box<dyn ProgressListener>,
    source: Box<dyn SnapshotSource>,
    options: AnalysisOptions,
}

impl HeapAnalyzer {
    pub fn new(excluded_refs: ExcludedRefs, inspectors: Vec<Box<dyn ReachabilityInspector>>) -> Self {
        Self {
            excluded_refs,
            inspectors,
            class_metadata: Box::new(NoClassMetadata),
            listener: Box::new(NoopProgressListener),
            source: Box::new(JsonSnapshotSource::new()),
            options: AnalysisOptions::default(),
        }
    }

    /// Analyzer for a validated configuration
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.excluded_refs(), config.reachability_inspectors())
            .with_class_metadata(Box::new(config.class_metadata.clone()))
            .with_options(AnalysisOptions {
                marker_class: config.marker_class.clone(),
                bitmap_correction: config.bitmap_correction,
                bitmap_class: config.bitmap_class.clone(),
                bitmap_buffer_field: config.bitmap_buffer_field.clone(),
            })
    }

    pub fn with_listener(mut self, listener: Box<dyn ProgressListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn with_class_metadata(mut self, class_metadata: Box<dyn ClassMetadata>) -> Self {
        self.class_metadata = class_metadata;
        self
    }

    pub fn with_snapshot_source(mut self, source: Box<dyn SnapshotSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_options(mut self, options: AnalysisOptions) -> Self {
        self.options = options;
        self
    }

    pub fn excluded_refs(&self) -> &ExcludedRefs {
        &self.excluded_refs
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Look for the tag record `key` in the dump at `path` and explain what
    /// keeps its referent alive
    pub fn check_for_leak(&self, path: &Path, key: &str, compute_retained_size: bool) -> AnalysisResult {
        let started = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.notify(AnalyzerStep::ReadingHeapDumpFile);
            if !path.exists() {
                return Err(AnalyzerError::SnapshotNotFound(path.to_path_buf()));
            }
            self.notify(AnalyzerStep::ParsingHeapDump);
            let graph = self.source.open(path)?;
            self.find_leak(graph, key, compute_retained_size, started)
        }));
        self.finish(outcome, started)
    }

    /// Same as `check_for_leak` on an already loaded graph
    pub fn analyze_graph(&self, graph: HeapGraph, key: &str, compute_retained_size: bool) -> AnalysisResult {
        let started = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            self.find_leak(graph, key, compute_retained_size, started)
        }));
        self.finish(outcome, started)
    }

    /// Every tag record in the dump whose referent is still present
    pub fn find_tracked_references(&self, path: &Path) -> Result<Vec<TrackedReference>> {
        if !path.exists() {
            return Err(AnalyzerError::SnapshotNotFound(path.to_path_buf()));
        }
        let mut graph = self.source.open(path)?;
        deduplicate_gc_roots(&mut graph);
        find_tracked_references(&graph, &self.options.marker_class)
    }

    fn notify(&self, step: AnalyzerStep) {
        notify(self.listener.as_ref(), step);
    }

    fn finish(
        &self,
        outcome: std::thread::Result<Result<AnalysisResult>>,
        started: Instant,
    ) -> AnalysisResult {
        match outcome {
            Ok(Ok(result)) => {
                info!(
                    "Analysis finished in {} ms, leak found: {}",
                    result.analysis_duration_ms(),
                    result.is_leak()
                );
                result
            }
            Ok(Err(error)) => {
                info!("Analysis failed: {}", error);
                AnalysisResult::failure(error, started.elapsed())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                info!("Analysis panicked: {}", message);
                AnalysisResult::failure(AnalyzerError::Panic(message), started.elapsed())
            }
        }
    }

    fn find_leak(
        &self,
        mut graph: HeapGraph,
        key: &str,
        compute_retained_size: bool,
        started: Instant,
    ) -> Result<AnalysisResult> {
        self.notify(AnalyzerStep::DeduplicatingGcRoots);
        let removed = deduplicate_gc_roots(&mut graph);
        debug!("Removed {} duplicate GC roots", removed);

        self.notify(AnalyzerStep::FindingLeakingRef);
        let leaking_ref = find_leaking_reference(&graph, key, &self.options.marker_class)?;
        // Cleared between the key check and the heap dump.
        let Some(referent) = leaking_ref.referent else {
            return Ok(AnalysisResult::no_leak(
                leaking_ref.declared_class_name,
                started.elapsed(),
            ));
        };
        let class_name = graph.class_name(graph.object(referent)?).to_string();

        self.notify(AnalyzerStep::FindingShortestPath);
        let path = ShortestPathFinder::new(&self.excluded_refs).find_path(&graph, referent)?;
        if path.leaking_node.is_none() {
            return Ok(AnalysisResult::no_leak(class_name, started.elapsed()));
        }

        self.notify(AnalyzerStep::BuildingLeakTrace);
        let leak_trace =
            LeakTraceBuilder::new(&graph, self.class_metadata.as_ref(), &self.inspectors)
                .build(&path)?;

        let retained_heap_size = if compute_retained_size {
            self.notify(AnalyzerStep::ComputingDominators);
            let mut retained = graph
                .compute_dominators()
                .retained_size(referent)
                .unwrap_or(0);

            if self.options.bitmap_correction {
                self.notify(AnalyzerStep::ComputingBitmapSize);
                retained += compute_ignored_bitmap_retained_size(
                    &graph,
                    referent,
                    &self.options.bitmap_class,
                    &self.options.bitmap_buffer_field,
                )?;
            }
            RetainedSize::Bytes(retained)
        } else {
            RetainedSize::Skipped
        };

        Ok(AnalysisResult::leak_detected(
            path.excluding_known_leaks,
            class_name,
            leak_trace,
            retained_heap_size,
            started.elapsed(),
        ))
    }
}

impl std::fmt::Debug for HeapAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapAnalyzer")
            .field("excluded_refs", &self.excluded_refs.rules().len())
            .field(
                "inspectors",
                &self.inspectors.iter().map(|i| i.name()).collect::<Vec<_>>(),
            )
            .field("options", &self.options)
            .finish()
    }
}
