//! Leak trace construction from a shortest path

use once_cell::sync::Lazy;
use regex::Regex;

use super::domain::{Holder, LeakReference, LeakTrace, LeakTraceElement, ReferenceKind};
use super::ports::ClassMetadata;
use crate::errors::{AnalyzerError, Result};
use crate::features::reachability::{compute_expected_reachability, ReachabilityInspector};
use crate::features::shortest_path::{LeakPathNode, ShortestPathResult};
use crate::shared::constants::OBJECT_CLASS;
use crate::shared::models::{ClassObj, HeapGraph, HeapObject, ValueType};

/// Compiler-generated name of an anonymous class, e.g. `Outer$1`
static ANONYMOUS_CLASS_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.+\$\d+$").expect("anonymous class pattern is valid"));

pub fn is_anonymous_class_name(class_name: &str) -> bool {
    ANONYMOUS_CLASS_NAME.is_match(class_name)
}

/// Every field or array entry of `object`, stringified
///
/// Class objects list their static fields. Instances list their class's
/// static fields followed by their own instance fields. Object arrays list
/// their entries; primitive arrays list nothing.
pub fn describe_fields(graph: &HeapGraph, object: &HeapObject) -> Result<Vec<LeakReference>> {
    let mut references = Vec::new();
    match object {
        HeapObject::Class(class) => push_static_fields(graph, class, &mut references)?,
        HeapObject::Array(array) => {
            if array.element_type == ValueType::Object {
                for (index, value) in array.elements.iter().enumerate() {
                    references.push(LeakReference::new(
                        ReferenceKind::ArrayEntry,
                        index.to_string(),
                        graph.value_as_string(value)?,
                    ));
                }
            }
        }
        HeapObject::Instance(instance) => {
            if let Some(class) = graph.class(instance.class_id) {
                push_static_fields(graph, class, &mut references)?;
            }
            for field in &instance.fields {
                references.push(LeakReference::new(
                    ReferenceKind::InstanceField,
                    field.name.as_str(),
                    graph.value_as_string(&field.value)?,
                ));
            }
        }
    }
    Ok(references)
}

fn push_static_fields(
    graph: &HeapGraph,
    class: &ClassObj,
    references: &mut Vec<LeakReference>,
) -> Result<()> {
    for field in &class.static_fields {
        references.push(LeakReference::new(
            ReferenceKind::StaticField,
            field.name.as_str(),
            graph.value_as_string(&field.value)?,
        ));
    }
    Ok(())
}

/// Turns a shortest path into a `LeakTrace`
pub struct LeakTraceBuilder<'a> {
    graph: &'a HeapGraph,
    metadata: &'a dyn ClassMetadata,
    inspectors: &'a [Box<dyn ReachabilityInspector>],
}

impl<'a> LeakTraceBuilder<'a> {
    pub fn new(
        graph: &'a HeapGraph,
        metadata: &'a dyn ClassMetadata,
        inspectors: &'a [Box<dyn ReachabilityInspector>],
    ) -> Self {
        Self {
            graph,
            metadata,
            inspectors,
        }
    }

    /// Root-first trace with one element per path node
    pub fn build(&self, result: &ShortestPathResult) -> Result<LeakTrace> {
        if result.leaking_node.is_none() {
            return Err(AnalyzerError::traversal(
                "cannot build a leak trace without a leaking node",
            ));
        }
        let path = result.path();

        let mut elements = Vec::with_capacity(path.len());
        for (index, node) in path.iter().enumerate() {
            elements.push(self.build_element(node, path.get(index + 1).copied())?);
        }

        let expected_reachability = compute_expected_reachability(&elements, self.inspectors);
        Ok(LeakTrace {
            elements,
            expected_reachability,
        })
    }

    /// Element for `node`; the edge and exclusion come from `next`
    fn build_element(
        &self,
        node: &LeakPathNode,
        next: Option<&LeakPathNode>,
    ) -> Result<LeakTraceElement> {
        let holder = self.graph.object(node.object)?;
        let field_references = describe_fields(self.graph, holder)?;
        let class_name = self.graph.class_name(holder).to_string();

        let class_hierarchy = match holder {
            HeapObject::Instance(_) => {
                let mut hierarchy = self
                    .graph
                    .class_of(holder)
                    .map(|class| self.graph.class_hierarchy(class))
                    .unwrap_or_default();
                if hierarchy.is_empty() {
                    hierarchy.push(class_name.clone());
                }
                hierarchy
            }
            HeapObject::Class(_) | HeapObject::Array(_) => vec![class_name.clone()],
        };

        let (holder_type, extra) = self.classify(holder, &class_name);

        Ok(LeakTraceElement {
            reference: next.and_then(|n| n.reference.clone()),
            holder: holder_type,
            class_hierarchy,
            extra,
            exclusion: next.and_then(|n| n.exclusion.clone()),
            field_references,
        })
    }

    fn classify(&self, holder: &HeapObject, class_name: &str) -> (Holder, Option<String>) {
        let class = match holder {
            HeapObject::Class(_) => return (Holder::Class, None),
            HeapObject::Array(_) => return (Holder::Array, None),
            HeapObject::Instance(_) => match self.graph.class_of(holder) {
                Some(class) => class,
                None => return (Holder::Object, None),
            },
        };

        if self.graph.extends_thread(class) {
            let extra = self
                .graph
                .thread_name(holder.id())
                .map(|name| format!("(named '{}')", name));
            return (Holder::Thread, extra);
        }

        if !is_anonymous_class_name(class_name) {
            return (Holder::Object, None);
        }

        let super_name = self
            .graph
            .super_class(class)
            .map(|c| c.name.as_str())
            .unwrap_or(OBJECT_CLASS);
        let extra = if super_name == OBJECT_CLASS {
            // Anonymous classes extending Object usually implement an interface.
            self.metadata
                .interfaces(class_name)
                .map(|interfaces| match interfaces.first() {
                    Some(interface) => format!("(anonymous implementation of {})", interface),
                    None => format!("(anonymous subclass of {})", OBJECT_CLASS),
                })
        } else {
            Some(format!("(anonymous subclass of {})", super_name))
        };
        (Holder::Object, extra)
    }
}
