//! Heap graph model
//!
//! The parsed representation of objects, classes, arrays, fields and roots.
//! Built once per analysis run and dropped afterwards.

pub mod graph;
pub mod object;
pub mod root;

pub use graph::{HeapGraph, HeapSnapshot};
pub use object::{
    ArrayInstance, ClassInstance, ClassObj, Field, FieldValue, HeapObject, ObjectId, ValueType,
};
pub use root::{GcRoot, RootKind};
