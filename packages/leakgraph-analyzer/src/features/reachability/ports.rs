//! Reachability ports

use super::domain::Reachability;
use crate::features::leak_trace::LeakTraceElement;

// ═══════════════════════════════════════════════════════════════════════════
// Inspector Port
// ═══════════════════════════════════════════════════════════════════════════

/// Judges whether one trace element should still be reachable
///
/// Inspectors see only the built element (class hierarchy and field dump),
/// never the heap itself. Return `Unknown` for anything outside the
/// inspector's class.
///
/// # Implementors
/// - `BuiltinInspector`
/// - `FieldValueInspector`
pub trait ReachabilityInspector: Send + Sync {
    fn expected_reachability(&self, element: &LeakTraceElement) -> Reachability;

    /// Inspector name for logging
    fn name(&self) -> &str;
}
