//! JSON snapshot reader
//!
//! The file is memory-mapped and decoded in one pass into a `HeapSnapshot`.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

use super::ports::SnapshotSource;
use crate::errors::{AnalyzerError, Result};
use crate::shared::models::{HeapGraph, HeapSnapshot};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSnapshotSource;

impl JsonSnapshotSource {
    pub fn new() -> Self {
        Self
    }

    /// Decode without indexing
    pub fn read_snapshot(&self, path: &Path) -> Result<HeapSnapshot> {
        if !path.exists() {
            return Err(AnalyzerError::SnapshotNotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        // The mapping is read-only and dropped before this function returns.
        let mmap = unsafe { Mmap::map(&file)? };
        let snapshot: HeapSnapshot = serde_json::from_slice(&mmap)?;
        debug!(
            "Read {} objects and {} roots from {}",
            snapshot.objects.len(),
            snapshot.roots.len(),
            path.display()
        );
        Ok(snapshot)
    }

    /// Write a snapshot in the format `read_snapshot` accepts
    pub fn write_snapshot(&self, path: &Path, snapshot: &HeapSnapshot) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer(std::io::BufWriter::new(file), snapshot)?;
        Ok(())
    }
}

impl SnapshotSource for JsonSnapshotSource {
    fn open(&self, path: &Path) -> Result<HeapGraph> {
        HeapGraph::from_snapshot(self.read_snapshot(path)?)
    }
}
