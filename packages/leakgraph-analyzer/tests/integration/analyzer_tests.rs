//! End-to-end leak checks through `HeapAnalyzer`
//!
//! Each test builds a small synthetic heap, tags one object and checks the
//! reported leak trace, retained size and progress callbacks.

#[path = "../common/mod.rs"]
mod common;
use common::*;

use std::sync::{Arc, Mutex};

use leakgraph_analyzer::features::leak_trace::StaticClassMetadata;
use leakgraph_analyzer::features::reachability::android_inspectors;
use leakgraph_analyzer::pipeline::render_text;
use leakgraph_analyzer::shared::models::{FieldValue, ObjectId, RootKind, ValueType};
use leakgraph_analyzer::{
    AnalysisOptions, AnalysisResult, AnalyzerConfig, AnalyzerError, AnalyzerStep, ExcludedRefs,
    HeapAnalyzer, Holder, JsonSnapshotSource, ProgressListener, Reachability, ReferenceKind,
    RetainedSize,
};
use pretty_assertions::assert_eq;

const KEY: &str = "9f1c4a2e-watched";

fn plain_analyzer() -> HeapAnalyzer {
    HeapAnalyzer::new(ExcludedRefs::none(), android_inspectors())
}

/// `com.example.Registry.sActivity` → destroyed `MainActivity`
fn static_activity_leak() -> (HeapGraphBuilder, ObjectId) {
    let mut heap = HeapGraphBuilder::new();
    heap.class("android.app.Activity");
    heap.class_extending("com.example.MainActivity", Some("android.app.Activity"));
    let activity = heap.instance(
        "com.example.MainActivity",
        vec![("mDestroyed", FieldValue::Boolean(true))],
    );
    let registry = heap.class_with_statics(
        "com.example.Registry",
        Some("java.lang.Object"),
        vec![("sActivity", obj(activity))],
    );
    heap.root(RootKind::SystemClass, registry);
    heap.watch(KEY, Some(activity));
    (heap, activity)
}

#[derive(Clone, Default)]
struct RecordingListener(Arc<Mutex<Vec<AnalyzerStep>>>);

impl RecordingListener {
    fn steps(&self) -> Vec<AnalyzerStep> {
        self.0.lock().unwrap().clone()
    }
}

impl ProgressListener for RecordingListener {
    fn on_progress_update(&self, step: AnalyzerStep) {
        self.0.lock().unwrap().push(step);
    }
}

struct PanickingListener;

impl ProgressListener for PanickingListener {
    fn on_progress_update(&self, step: AnalyzerStep) {
        panic!("listener failed on {}", step);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Leak traces
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn static_field_leak_is_reported() {
    let (heap, _) = static_activity_leak();
    let result = plain_analyzer().analyze_graph(heap.build(), KEY, true);

    let AnalysisResult::LeakFound {
        excluded_leak,
        class_name,
        leak_trace,
        retained_heap_size,
        ..
    } = &result
    else {
        panic!("expected a leak, got {:?}", result);
    };
    assert!(!*excluded_leak);
    assert!(result.is_leak());
    assert_eq!(class_name, "com.example.MainActivity");
    assert_eq!(leak_trace.len(), 2);

    let root = &leak_trace.elements[0];
    assert_eq!(root.holder, Holder::Class);
    assert_eq!(root.class_name(), "com.example.Registry");
    let reference = root.reference.as_ref().unwrap();
    assert_eq!(reference.kind, ReferenceKind::StaticField);
    assert_eq!(reference.name.as_deref(), Some("sActivity"));

    let leaking = &leak_trace.elements[1];
    assert!(leaking.reference.is_none());
    assert_eq!(
        leaking.class_hierarchy,
        vec!["com.example.MainActivity", "android.app.Activity"]
    );
    assert_eq!(
        leak_trace.expected_reachability,
        vec![Reachability::Reachable, Reachability::Unreachable]
    );
    assert_eq!(*retained_heap_size, RetainedSize::Bytes(16));
}

#[test]
fn text_report_lists_the_trace() {
    let (heap, _) = static_activity_leak();
    let result = plain_analyzer().analyze_graph(heap.build(), KEY, true);
    let text = render_text(&result, true);

    assert!(text.contains("* com.example.MainActivity has leaked:"));
    assert!(text.contains("* static Registry.!(sActivity)!"));
    assert!(text.contains("* ↳ MainActivity"));
    assert!(text.contains("* Retaining: 16 B."));
    assert!(text.contains("* Details:"));
    assert!(text.contains("|   mDestroyed = true"));
    assert!(!text.contains("EXCLUDED LEAK"));
}

#[test]
fn undecodable_string_field_does_not_fail_the_analysis() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("com.example.Target");
    heap.class("com.example.Holder");
    let target = heap.instance("com.example.Target", Vec::new());
    // Contents stored inline, no backing array.
    let label = heap.instance("java.lang.String", vec![("count", FieldValue::Int(3))]);
    let holder = heap.instance(
        "com.example.Holder",
        vec![("label", obj(label)), ("target", obj(target))],
    );
    let registry = heap.class_with_statics(
        "com.example.Registry",
        Some("java.lang.Object"),
        vec![("sHolder", obj(holder))],
    );
    heap.root(RootKind::SystemClass, registry);
    heap.watch(KEY, Some(target));

    let result = plain_analyzer().analyze_graph(heap.build(), KEY, false);
    let AnalysisResult::LeakFound { leak_trace, .. } = &result else {
        panic!("expected a leak, got {:?}", result);
    };
    assert_eq!(leak_trace.len(), 3);
    let label_field = leak_trace.elements[1]
        .field_references
        .iter()
        .find(|r| r.name.as_deref() == Some("label"))
        .unwrap();
    assert_eq!(
        label_field.value.as_deref(),
        Some(format!("java.lang.String@{}", label).as_str())
    );
}

#[test]
fn excluded_path_is_used_only_without_a_clean_one() {
    let (mut heap, activity) = static_activity_leak();
    let mut excluded = ExcludedRefs::builder();
    excluded
        .static_field("com.example.Registry", "sActivity")
        .named("REGISTRY")
        .reason("cleared on next frame");

    let analyzer = HeapAnalyzer::new(excluded.build(), Vec::new());
    let result = analyzer.analyze_graph(heap.build(), KEY, false);
    let AnalysisResult::LeakFound {
        excluded_leak,
        leak_trace,
        ..
    } = &result
    else {
        panic!("expected a leak, got {:?}", result);
    };
    assert!(*excluded_leak);
    assert!(!result.is_leak());
    let exclusion = leak_trace.elements[0].exclusion.as_ref().unwrap();
    assert_eq!(exclusion.name.as_deref(), Some("REGISTRY"));
    assert_eq!(exclusion.matching, "static field com.example.Registry#sActivity");
    assert!(render_text(&result, false).contains("* EXCLUDED LEAK."));

    // A longer, clean path wins.
    heap.class("com.example.Holder");
    let holder = heap.instance("com.example.Holder", vec![("activity", obj(activity))]);
    let cache = heap.object_array(vec![holder]);
    let app = heap.class_with_statics(
        "com.example.App",
        Some("java.lang.Object"),
        vec![("sCache", obj(cache))],
    );
    heap.root(RootKind::SystemClass, app);

    let result = analyzer.analyze_graph(heap.build(), KEY, false);
    let AnalysisResult::LeakFound {
        excluded_leak,
        leak_trace,
        ..
    } = &result
    else {
        panic!("expected a leak, got {:?}", result);
    };
    assert!(!*excluded_leak);
    assert_eq!(leak_trace.len(), 4);
    assert!(leak_trace.elements.iter().all(|e| e.exclusion.is_none()));
    assert_eq!(leak_trace.elements[1].holder, Holder::Array);
    assert_eq!(
        leak_trace.elements[1].reference.as_ref().unwrap().display_name(),
        "[0]"
    );
}

#[test]
fn main_thread_locals_are_excluded_by_default() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("com.example.Job");
    let job = heap.instance("com.example.Job", Vec::new());
    let main = heap.thread("main");
    heap.java_local(job, main);
    heap.watch(KEY, Some(job));

    let analyzer = HeapAnalyzer::from_config(&AnalyzerConfig::default());
    let result = analyzer.analyze_graph(heap.build(), KEY, false);
    match result {
        AnalysisResult::NoLeak { class_name, .. } => assert_eq!(class_name, "com.example.Job"),
        other => panic!("expected no leak, got {:?}", other),
    }
}

#[test]
fn worker_thread_local_is_held_by_its_thread() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("com.example.Job");
    let job = heap.instance("com.example.Job", Vec::new());
    let worker = heap.thread("worker-1");
    heap.java_local(job, worker);
    heap.watch(KEY, Some(job));

    let analyzer = HeapAnalyzer::from_config(&AnalyzerConfig::default());
    let result = analyzer.analyze_graph(heap.build(), KEY, false);
    let trace = result.leak_trace().expect("leak");
    assert_eq!(trace.len(), 2);

    let thread = &trace.elements[0];
    assert_eq!(thread.holder, Holder::Thread);
    assert_eq!(thread.extra.as_deref(), Some("(named 'worker-1')"));
    assert_eq!(thread.reference.as_ref().unwrap().kind, ReferenceKind::Local);
    assert_eq!(thread.render(false), "thread Thread.<Java Local> (named 'worker-1')");
}

#[test]
fn weak_referent_does_not_keep_object_alive() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("com.example.Job");
    let job = heap.instance("com.example.Job", Vec::new());
    let weak = heap.instance("java.lang.ref.WeakReference", vec![("referent", obj(job))]);
    let cache = heap.class_with_statics(
        "com.example.Cache",
        Some("java.lang.Object"),
        vec![("sRef", obj(weak))],
    );
    heap.root(RootKind::SystemClass, cache);
    heap.watch(KEY, Some(job));

    let result = plain_analyzer().analyze_graph(heap.build(), KEY, true);
    assert!(matches!(result, AnalysisResult::NoLeak { .. }), "{:?}", result);
}

#[test]
fn anonymous_holder_names_its_interface() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("com.example.Job");
    heap.class("com.example.MainActivity$1");
    let job = heap.instance("com.example.Job", Vec::new());
    let callback = heap.instance("com.example.MainActivity$1", vec![("this$0", obj(job))]);
    let bus = heap.class_with_statics(
        "com.example.Bus",
        Some("java.lang.Object"),
        vec![("sCallback", obj(callback))],
    );
    heap.root(RootKind::SystemClass, bus);
    heap.watch(KEY, Some(job));

    let metadata = StaticClassMetadata::new()
        .with_interfaces("com.example.MainActivity$1", ["java.lang.Runnable"]);
    let analyzer = plain_analyzer().with_class_metadata(Box::new(metadata));
    let result = analyzer.analyze_graph(heap.build(), KEY, false);
    let trace = result.leak_trace().expect("leak");

    assert_eq!(trace.len(), 3);
    assert_eq!(
        trace.elements[1].extra.as_deref(),
        Some("(anonymous implementation of java.lang.Runnable)")
    );

    // Without metadata nothing is known about the interface.
    let result = plain_analyzer().analyze_graph(heap.build(), KEY, false);
    assert_eq!(result.leak_trace().expect("leak").elements[1].extra, None);
}

#[test]
fn string_target_is_traversed() {
    let mut heap = HeapGraphBuilder::new();
    let token = heap.string("session-token");
    let config = heap.class_with_statics(
        "com.example.Config",
        Some("java.lang.Object"),
        vec![("sToken", obj(token))],
    );
    heap.root(RootKind::SystemClass, config);
    heap.watch(KEY, Some(token));

    let result = plain_analyzer().analyze_graph(heap.build(), KEY, false);
    assert_eq!(result.class_name(), Some("java.lang.String"));
    assert!(result.is_leak());
}

// ═══════════════════════════════════════════════════════════════════════════
// Retained size
// ═══════════════════════════════════════════════════════════════════════════

/// Activity holding a bitmap that a native root also holds
fn bitmap_leak() -> HeapGraphBuilder {
    let (mut heap, activity) = static_activity_leak();
    heap.class("android.graphics.Bitmap");
    let pixels = heap.primitive_array("byte[]", ValueType::Byte, 4096);
    let bitmap = heap.instance_sized("android.graphics.Bitmap", 32, vec![("mBuffer", obj(pixels))]);
    heap.set_field(activity, "mIcon", obj(bitmap));
    heap.root(RootKind::Unknown, bitmap);
    heap
}

#[test]
fn bitmap_behind_native_root_is_charged_to_the_leak() {
    let result = plain_analyzer().analyze_graph(bitmap_leak().build(), KEY, true);
    match result {
        AnalysisResult::LeakFound {
            retained_heap_size, ..
        } => assert_eq!(retained_heap_size, RetainedSize::Bytes(16 + 32 + 4096)),
        other => panic!("expected a leak, got {:?}", other),
    }
}

#[test]
fn bitmap_correction_can_be_disabled() {
    let analyzer = plain_analyzer().with_options(AnalysisOptions {
        bitmap_correction: false,
        ..AnalysisOptions::default()
    });
    let result = analyzer.analyze_graph(bitmap_leak().build(), KEY, true);
    match result {
        AnalysisResult::LeakFound {
            retained_heap_size, ..
        } => assert_eq!(retained_heap_size, RetainedSize::Bytes(16)),
        other => panic!("expected a leak, got {:?}", other),
    }
}

#[test]
fn retained_size_can_be_skipped() {
    let recorder = RecordingListener::default();
    let analyzer = plain_analyzer().with_listener(Box::new(recorder.clone()));
    let result = analyzer.analyze_graph(bitmap_leak().build(), KEY, false);

    match result {
        AnalysisResult::LeakFound {
            retained_heap_size, ..
        } => assert_eq!(retained_heap_size, RetainedSize::Skipped),
        other => panic!("expected a leak, got {:?}", other),
    }
    assert!(!recorder.steps().contains(&AnalyzerStep::ComputingDominators));
}

// ═══════════════════════════════════════════════════════════════════════════
// No leak and failures
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn cleared_reference_is_not_a_leak() {
    let mut heap = HeapGraphBuilder::new();
    heap.watch(KEY, None);

    let result = plain_analyzer().analyze_graph(heap.build(), KEY, true);
    match result {
        AnalysisResult::NoLeak { class_name, .. } => assert_eq!(class_name, MARKER_CLASS),
        other => panic!("expected no leak, got {:?}", other),
    }
}

#[test]
fn unknown_key_is_a_failure() {
    let (heap, _) = static_activity_leak();
    let result = plain_analyzer().analyze_graph(heap.build(), "missing", true);

    assert!(result.is_failure());
    match result.error() {
        Some(AnalyzerError::MissingTagRecord { key, found }) => {
            assert_eq!(key, "missing");
            assert_eq!(found, &vec![Some(KEY.to_string())]);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(render_text(&result, false).starts_with("* FAILURE in analysis: "));
}

#[test]
fn missing_marker_class_is_a_failure() {
    let (heap, _) = static_activity_leak();
    let analyzer = plain_analyzer().with_options(AnalysisOptions {
        marker_class: "com.example.Watched".to_string(),
        ..AnalysisOptions::default()
    });
    let result = analyzer.analyze_graph(heap.build(), KEY, true);
    assert_eq!(
        result.error().map(ToString::to_string).as_deref(),
        Some("Could not find the com.example.Watched class in the heap dump.")
    );
}

#[test]
fn missing_snapshot_file_is_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let result = plain_analyzer().check_for_leak(&path, KEY, true);
    assert!(matches!(
        result.error(),
        Some(AnalyzerError::SnapshotNotFound(p)) if *p == path
    ));
}

// ═══════════════════════════════════════════════════════════════════════════
// Progress
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn progress_steps_are_reported_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("heap.json");
    JsonSnapshotSource::new()
        .write_snapshot(&path, &bitmap_leak().snapshot())
        .unwrap();

    let recorder = RecordingListener::default();
    let analyzer = plain_analyzer().with_listener(Box::new(recorder.clone()));
    let result = analyzer.check_for_leak(&path, KEY, true);

    assert!(result.is_leak(), "{:?}", result);
    assert_eq!(recorder.steps(), AnalyzerStep::ALL.to_vec());
}

#[test]
fn panicking_listener_does_not_abort_analysis() {
    let (heap, _) = static_activity_leak();
    let analyzer = plain_analyzer().with_listener(Box::new(PanickingListener));
    let result = analyzer.analyze_graph(heap.build(), KEY, true);
    assert!(result.is_leak(), "{:?}", result);
}
