//! Expected reachability of leak trace elements
//!
//! Inspectors look at individual trace elements; the classifier turns their
//! verdicts into a monotonic reachable → unknown → unreachable split that
//! points at the references most likely to cause the leak.

pub mod classifier;
pub mod domain;
pub mod inspectors;
pub mod ports;

pub use classifier::compute_expected_reachability;
pub use domain::Reachability;
pub use inspectors::{android_inspectors, BuiltinInspector, FieldValueInspector, InspectorSpec};
pub use ports::ReachabilityInspector;
