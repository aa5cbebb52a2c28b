//! Expected reachability along a leak trace

use super::domain::Reachability;
use super::ports::ReachabilityInspector;
use crate::features::leak_trace::LeakTraceElement;

/// First non-`Unknown` verdict among `inspectors`, in order
fn inspect(element: &LeakTraceElement, inspectors: &[Box<dyn ReachabilityInspector>]) -> Reachability {
    inspectors
        .iter()
        .map(|inspector| inspector.expected_reachability(element))
        .find(|verdict| *verdict != Reachability::Unknown)
        .unwrap_or(Reachability::Unknown)
}

/// One verdict per element
///
/// The first element is a GC root and always reachable, the last is the
/// leaking instance and unreachable. Interior elements are inspected from
/// the root down: everything up to the last reachable verdict is
/// reachable, everything from the first unreachable verdict on is
/// unreachable, and the gap between them is unknown.
pub fn compute_expected_reachability(
    elements: &[LeakTraceElement],
    inspectors: &[Box<dyn ReachabilityInspector>],
) -> Vec<Reachability> {
    if elements.is_empty() {
        return Vec::new();
    }
    let last_index = elements.len() - 1;
    let mut last_reachable = 0;
    let mut first_unreachable = last_index;

    for (index, element) in elements.iter().enumerate().take(last_index).skip(1) {
        match inspect(element, inspectors) {
            Reachability::Reachable => last_reachable = index,
            Reachability::Unreachable => {
                first_unreachable = index;
                break;
            }
            Reachability::Unknown => {}
        }
    }

    (0..elements.len())
        .map(|index| {
            if index <= last_reachable {
                Reachability::Reachable
            } else if index >= first_unreachable {
                Reachability::Unreachable
            } else {
                Reachability::Unknown
            }
        })
        .collect()
}
