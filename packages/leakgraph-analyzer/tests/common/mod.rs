//! Common test utilities for leakgraph-analyzer
//!
//! Builders for synthetic heap snapshots shared by the integration tests.

#![allow(dead_code)]

mod builders;

pub use builders::*;
