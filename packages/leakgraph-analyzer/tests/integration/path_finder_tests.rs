//! Shortest path search and leak trace construction on synthetic heaps

#[path = "../common/mod.rs"]
mod common;
use common::*;

use leakgraph_analyzer::features::leak_trace::{LeakTraceBuilder, NoClassMetadata};
use leakgraph_analyzer::features::root_dedup::deduplicate_gc_roots;
use leakgraph_analyzer::features::shortest_path::{ShortestPathFinder, ShortestPathResult};
use leakgraph_analyzer::shared::models::{FieldValue, HeapGraph, ObjectId, RootKind};
use leakgraph_analyzer::{ExcludedRefs, Holder};

fn find(graph: &HeapGraph, excluded: &ExcludedRefs, target: ObjectId) -> ShortestPathResult {
    ShortestPathFinder::new(excluded)
        .find_path(graph, target)
        .expect("search succeeds")
}

fn objects(result: &ShortestPathResult) -> Vec<ObjectId> {
    result.path().iter().map(|node| node.object).collect()
}

fn static_holder(heap: &mut HeapGraphBuilder, class_name: &str, field: &str, value: ObjectId) -> ObjectId {
    let class = heap.class_with_statics(class_name, Some("java.lang.Object"), vec![(field, obj(value))]);
    heap.root(RootKind::SystemClass, class);
    class
}

// ═══════════════════════════════════════════════════════════════════════════
// Breadth-first order
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn shortest_of_two_paths_is_returned() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("com.example.Node");
    let target = heap.instance("com.example.Node", Vec::new());
    let middle = heap.instance("com.example.Node", vec![("next", obj(target))]);
    let far = heap.instance("com.example.Node", vec![("next", obj(middle))]);
    static_holder(&mut heap, "com.example.Long", "sHead", far);
    let short = static_holder(&mut heap, "com.example.Short", "sNode", target);

    let result = find(&heap.build(), &ExcludedRefs::none(), target);
    assert_eq!(result.path_length(), Some(1));
    assert_eq!(objects(&result), vec![short, target]);
    assert!(!result.excluding_known_leaks);
}

#[test]
fn clean_path_wins_a_tie_with_an_excluded_one() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("com.example.Node");
    let target = heap.instance("com.example.Node", Vec::new());
    // Excluded root comes first in root order.
    static_holder(&mut heap, "com.example.Cache", "sEntry", target);
    let clean = static_holder(&mut heap, "com.example.Session", "sCurrent", target);

    let mut excluded = ExcludedRefs::builder();
    excluded.static_field("com.example.Cache", "sEntry");

    let result = find(&heap.build(), &excluded.build(), target);
    assert_eq!(result.path_length(), Some(1));
    assert_eq!(objects(&result), vec![clean, target]);
    assert!(!result.excluding_known_leaks);
}

#[test]
fn cycles_terminate() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("com.example.Node");
    let a = heap.instance("com.example.Node", Vec::new());
    let b = heap.instance("com.example.Node", vec![("prev", obj(a))]);
    heap.set_field(a, "next", obj(b));
    let unreachable = heap.instance("com.example.Node", Vec::new());
    static_holder(&mut heap, "com.example.Ring", "sHead", a);

    let result = find(&heap.build(), &ExcludedRefs::none(), unreachable);
    assert!(result.leaking_node.is_none());
    assert!(result.path().is_empty());
    assert_eq!(result.path_length(), None);
}

#[test]
fn duplicate_roots_are_collapsed() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("com.example.Node");
    let target = heap.instance("com.example.Node", Vec::new());
    for _ in 0..3 {
        heap.root(RootKind::NativeStack, target);
    }
    heap.root(RootKind::JavaStatic, target);

    let mut graph = heap.build();
    assert_eq!(deduplicate_gc_roots(&mut graph), 2);
    assert_eq!(graph.roots().len(), 2);

    let result = find(&graph, &ExcludedRefs::none(), target);
    assert_eq!(result.path_length(), Some(0));
}

// ═══════════════════════════════════════════════════════════════════════════
// Pruning
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn strings_are_not_traversed_unless_targeted() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("com.example.Node");
    let target = heap.instance("com.example.Node", Vec::new());
    let text = heap.string("label");
    heap.set_field(text, "owner", obj(target));
    static_holder(&mut heap, "com.example.Labels", "sLabel", text);
    let graph = heap.build();

    assert!(find(&graph, &ExcludedRefs::none(), target).leaking_node.is_none());

    let result = find(&graph, &ExcludedRefs::none(), text);
    assert_eq!(result.path_length(), Some(1));
}

#[test]
fn primitive_wrappers_are_not_traversed() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("java.lang.Integer");
    heap.class("com.example.Node");
    let target = heap.instance("com.example.Node", Vec::new());
    let boxed = heap.instance(
        "java.lang.Integer",
        vec![("value", FieldValue::Int(7)), ("shadow", obj(target))],
    );
    static_holder(&mut heap, "com.example.Counters", "sCount", boxed);
    let graph = heap.build();

    assert!(find(&graph, &ExcludedRefs::none(), target).leaking_node.is_none());
    assert_eq!(find(&graph, &ExcludedRefs::none(), boxed).path_length(), Some(1));
}

#[test]
fn non_traversable_roots_do_not_start_paths() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("com.example.Node");
    let target = heap.instance("com.example.Node", Vec::new());
    let holder = heap.instance("com.example.Node", vec![("next", obj(target))]);
    heap.root(RootKind::Finalizing, holder);
    heap.root(RootKind::Unknown, holder);
    heap.root(RootKind::InternedString, holder);

    let result = find(&heap.build(), &ExcludedRefs::none(), target);
    assert!(result.leaking_node.is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// Exclusions
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn inherited_field_exclusion_applies_to_subclasses() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("com.example.Base");
    heap.class_extending("com.example.Derived", Some("com.example.Base"));
    heap.class("com.example.Node");
    let target = heap.instance("com.example.Node", Vec::new());
    let derived = heap.instance("com.example.Derived", vec![("mListener", obj(target))]);
    static_holder(&mut heap, "com.example.Registry", "sDerived", derived);

    let mut excluded = ExcludedRefs::builder();
    excluded.instance_field("com.example.Base", "mListener").named("BASE_LISTENER");
    let result = find(&heap.build(), &excluded.build(), target);

    assert!(result.excluding_known_leaks);
    let path = result.path();
    assert_eq!(path.len(), 3);
    let exclusion = path[2].exclusion.as_ref().expect("edge is excluded");
    assert_eq!(exclusion.name.as_deref(), Some("BASE_LISTENER"));
    assert!(!exclusion.always_exclude);
}

#[test]
fn always_excluded_class_hides_all_its_references() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("com.example.Base");
    heap.class_extending("com.example.Derived", Some("com.example.Base"));
    heap.class("com.example.Node");
    let target = heap.instance("com.example.Node", Vec::new());
    let derived = heap.instance(
        "com.example.Derived",
        vec![("first", obj(target)), ("second", obj(target))],
    );
    static_holder(&mut heap, "com.example.Registry", "sDerived", derived);

    let mut excluded = ExcludedRefs::builder();
    excluded.subclass_of("com.example.Base").always_exclude();
    let result = find(&heap.build(), &excluded.build(), target);
    assert!(result.leaking_node.is_none());
}

#[test]
fn excluded_thread_locals_fall_back_behind_clean_paths() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("com.example.Node");
    let target = heap.instance("com.example.Node", Vec::new());
    let worker = heap.thread("io-worker");
    heap.java_local(target, worker);

    let mut excluded = ExcludedRefs::builder();
    excluded.thread("io-worker").named("IO_WORKER");
    let graph = heap.build();
    let result = find(&graph, &excluded.build(), target);

    assert!(result.excluding_known_leaks);
    assert_eq!(objects(&result), vec![worker, target]);
    assert_eq!(
        result.path()[1].exclusion.as_ref().map(|e| e.matching.as_str()),
        Some("any threads named io-worker")
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// Leak trace
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn trace_describes_each_holder() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("android.view.View");
    heap.class("com.example.Screen$2");
    heap.class_extending("com.example.Adapter$1", Some("android.view.View"));
    let target = heap.instance("android.view.View", vec![("mAttachInfo", FieldValue::Null)]);
    let anonymous = heap.instance("com.example.Adapter$1", vec![("mChild", obj(target))]);
    let unknown = heap.instance("com.example.Screen$2", vec![("this$0", obj(anonymous))]);
    let array = heap.object_array(vec![unknown]);
    static_holder(&mut heap, "com.example.Screens", "sAll", array);

    let graph = heap.build();
    let result = find(&graph, &ExcludedRefs::none(), target);
    let trace = LeakTraceBuilder::new(&graph, &NoClassMetadata, &[])
        .build(&result)
        .unwrap();

    let holders: Vec<Holder> = trace.elements.iter().map(|e| e.holder).collect();
    assert_eq!(
        holders,
        vec![Holder::Class, Holder::Array, Holder::Object, Holder::Object, Holder::Object]
    );
    assert_eq!(trace.elements[2].extra, None);
    assert_eq!(
        trace.elements[3].extra.as_deref(),
        Some("(anonymous subclass of android.view.View)")
    );
    assert_eq!(
        trace.elements[3].class_hierarchy,
        vec!["com.example.Adapter$1", "android.view.View"]
    );
    assert_eq!(trace.elements[1].field_references.len(), 1);
    assert!(trace.elements[4].reference.is_none());
}

#[test]
fn trace_needs_a_leaking_node() {
    let mut heap = HeapGraphBuilder::new();
    heap.class("com.example.Node");
    let target = heap.instance("com.example.Node", Vec::new());
    let graph = heap.build();
    let result = find(&graph, &ExcludedRefs::none(), target);

    assert!(LeakTraceBuilder::new(&graph, &NoClassMetadata, &[])
        .build(&result)
        .is_err());
}
