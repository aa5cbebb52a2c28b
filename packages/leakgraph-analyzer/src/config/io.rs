//! Configuration I/O (YAML schema)
//!
//! Defines the on-disk schema. Conversion to and from `AnalyzerConfig`
//! lives in analyzer_config.rs.

use serde::{Deserialize, Serialize};

use crate::features::exclusions::ExclusionRule;
use crate::features::leak_trace::StaticClassMetadata;
use crate::features::reachability::InspectorSpec;

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    /// Base preset
    pub preset: String,

    /// Rules added on top of the preset's exclusions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<ExclusionRule>,

    /// Replaces the preset's inspectors when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspectors: Option<Vec<InspectorSpec>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisOverrides>,

    /// Implemented interfaces by class name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_metadata: Option<StaticClassMetadata>,
}

/// Analysis switches and class names
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_retained_size: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitmap_correction: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_class: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitmap_class: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitmap_buffer_field: Option<String>,
}
