//! Leak traces: the human-readable chain from a GC root to the leak

pub mod builder;
pub mod domain;
pub mod metadata;
pub mod ports;

pub use builder::{describe_fields, is_anonymous_class_name, LeakTraceBuilder};
pub use domain::{Holder, LeakReference, LeakTrace, LeakTraceElement, ReferenceKind};
pub use metadata::{NoClassMetadata, StaticClassMetadata};
pub use ports::ClassMetadata;
