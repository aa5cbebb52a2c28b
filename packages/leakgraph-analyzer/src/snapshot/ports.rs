//! Snapshot source port

use std::path::Path;

use crate::errors::Result;
use crate::shared::models::HeapGraph;

/// Turns a heap dump file into an indexed `HeapGraph`
///
/// Binary dump formats plug in here; the crate ships a JSON reader.
pub trait SnapshotSource: Send + Sync {
    fn open(&self, path: &Path) -> Result<HeapGraph>;
}
