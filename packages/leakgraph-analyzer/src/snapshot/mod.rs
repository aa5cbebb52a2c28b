//! Heap snapshot loading

pub mod json;
pub mod ports;

pub use json::JsonSnapshotSource;
pub use ports::SnapshotSource;
