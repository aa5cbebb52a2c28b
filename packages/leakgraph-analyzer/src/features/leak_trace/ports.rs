//! Class metadata port
//!
//! Heap snapshots record superclasses but not implemented interfaces. The
//! trace builder asks this port when an anonymous class extends
//! `java.lang.Object` directly, to say which interface it implements.

/// Interface lookup by class name
pub trait ClassMetadata: Send + Sync {
    /// Interfaces implemented by `class_name`, in declaration order, or
    /// `None` when the class is unknown to this source
    fn interfaces(&self, class_name: &str) -> Option<Vec<String>>;
}
