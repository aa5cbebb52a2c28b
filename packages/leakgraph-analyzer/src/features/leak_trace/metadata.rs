//! Class metadata adapters

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::ports::ClassMetadata;

/// Knows no classes
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClassMetadata;

impl ClassMetadata for NoClassMetadata {
    fn interfaces(&self, _class_name: &str) -> Option<Vec<String>> {
        None
    }
}

/// Interface table supplied up front, typically from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticClassMetadata {
    interfaces: FxHashMap<String, Vec<String>>,
}

impl StaticClassMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interfaces(
        mut self,
        class_name: impl Into<String>,
        interfaces: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.insert(class_name, interfaces);
        self
    }

    pub fn insert(
        &mut self,
        class_name: impl Into<String>,
        interfaces: impl IntoIterator<Item = impl Into<String>>,
    ) {
        self.interfaces.insert(
            class_name.into(),
            interfaces.into_iter().map(Into::into).collect(),
        );
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}

impl ClassMetadata for StaticClassMetadata {
    fn interfaces(&self, class_name: &str) -> Option<Vec<String>> {
        self.interfaces.get(class_name).cloned()
    }
}
