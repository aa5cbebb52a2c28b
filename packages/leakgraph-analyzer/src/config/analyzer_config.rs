//! Analyzer configuration
//!
//! ```rust,ignore
//! let config = AnalyzerConfig::preset(Preset::Jvm)
//!     .exclusion(rule)
//!     .compute_retained_size(false);
//! config.validate()?;
//! let analyzer = HeapAnalyzer::from_config(&config);
//! ```

use std::path::Path;

use super::error::{ConfigError, ConfigResult};
use super::io::{AnalysisOverrides, ConfigExportV1};
use super::preset::Preset;
use crate::features::exclusions::{ExcludedRefs, ExclusionPattern, ExclusionRule};
use crate::features::leak_trace::StaticClassMetadata;
use crate::features::reachability::{InspectorSpec, ReachabilityInspector};
use crate::shared::constants::{BITMAP_BUFFER_FIELD, BITMAP_CLASS, KEYED_WEAK_REFERENCE_CLASS};

const SUPPORTED_VERSIONS: [u32; 1] = [1];

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub preset: Preset,
    /// Rules layered over the preset's exclusions
    pub exclusions: Vec<ExclusionRule>,
    /// `None` keeps the preset's inspectors
    pub inspectors: Option<Vec<InspectorSpec>>,
    pub compute_retained_size: bool,
    pub bitmap_correction: bool,
    pub marker_class: String,
    pub bitmap_class: String,
    pub bitmap_buffer_field: String,
    pub class_metadata: StaticClassMetadata,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::preset(Preset::default())
    }
}

impl AnalyzerConfig {
    pub fn preset(preset: Preset) -> Self {
        Self {
            preset,
            exclusions: Vec::new(),
            inspectors: None,
            compute_retained_size: true,
            bitmap_correction: preset.bitmap_correction(),
            marker_class: KEYED_WEAK_REFERENCE_CLASS.to_string(),
            bitmap_class: BITMAP_CLASS.to_string(),
            bitmap_buffer_field: BITMAP_BUFFER_FIELD.to_string(),
            class_metadata: StaticClassMetadata::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Builder setters
    // ═══════════════════════════════════════════════════════════════════════

    pub fn exclusion(mut self, rule: ExclusionRule) -> Self {
        self.exclusions.push(rule);
        self
    }

    pub fn exclusions(mut self, rules: impl IntoIterator<Item = ExclusionRule>) -> Self {
        self.exclusions.extend(rules);
        self
    }

    pub fn inspectors(mut self, inspectors: Vec<InspectorSpec>) -> Self {
        self.inspectors = Some(inspectors);
        self
    }

    pub fn compute_retained_size(mut self, enabled: bool) -> Self {
        self.compute_retained_size = enabled;
        self
    }

    pub fn bitmap_correction(mut self, enabled: bool) -> Self {
        self.bitmap_correction = enabled;
        self
    }

    pub fn marker_class(mut self, class_name: impl Into<String>) -> Self {
        self.marker_class = class_name.into();
        self
    }

    pub fn bitmap_class(mut self, class_name: impl Into<String>, buffer_field: impl Into<String>) -> Self {
        self.bitmap_class = class_name.into();
        self.bitmap_buffer_field = buffer_field.into();
        self
    }

    pub fn class_metadata(mut self, metadata: StaticClassMetadata) -> Self {
        self.class_metadata = metadata;
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Resolution
    // ═══════════════════════════════════════════════════════════════════════

    /// Preset exclusions followed by the configured rules
    pub fn excluded_refs(&self) -> ExcludedRefs {
        let mut builder = self.preset.excluded_refs();
        builder.rules(self.exclusions.iter().cloned());
        builder.build()
    }

    pub fn inspector_specs(&self) -> Vec<InspectorSpec> {
        self.inspectors
            .clone()
            .unwrap_or_else(|| self.preset.inspectors())
    }

    pub fn reachability_inspectors(&self) -> Vec<Box<dyn ReachabilityInspector>> {
        self.inspector_specs()
            .into_iter()
            .map(InspectorSpec::into_inspector)
            .collect()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.marker_class.trim().is_empty() {
            return Err(ConfigError::validation("marker_class", "must not be empty"));
        }
        if self.bitmap_correction
            && (self.bitmap_class.trim().is_empty() || self.bitmap_buffer_field.trim().is_empty())
        {
            return Err(ConfigError::validation(
                "bitmap_class",
                "bitmap class and buffer field must not be empty",
            ));
        }
        for (index, rule) in self.exclusions.iter().enumerate() {
            let names: Vec<&String> = match &rule.pattern {
                ExclusionPattern::InstanceField {
                    class_name,
                    field_name,
                }
                | ExclusionPattern::StaticField {
                    class_name,
                    field_name,
                } => vec![class_name, field_name],
                ExclusionPattern::Thread { thread_name } => vec![thread_name],
                ExclusionPattern::Class { class_name } => vec![class_name],
            };
            if names.iter().any(|name| name.trim().is_empty()) {
                return Err(ConfigError::validation(
                    format!("exclusions[{}]", index),
                    "class, field and thread names must not be empty",
                ));
            }
        }
        for (index, spec) in self.inspector_specs().iter().enumerate() {
            if let InspectorSpec::FieldValue(inspector) = spec {
                if inspector.class_name.trim().is_empty() || inspector.field_name.trim().is_empty() {
                    return Err(ConfigError::validation(
                        format!("inspectors[{}]", index),
                        "class_name and field_name must not be empty",
                    ));
                }
            }
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // YAML
    // ═══════════════════════════════════════════════════════════════════════

    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate a v1 document
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        if !SUPPORTED_VERSIONS.contains(&export.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: export.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let mut config = Self::preset(Preset::from_str(&export.preset)?);
        config.exclusions = export.exclusions;
        config.inspectors = export.inspectors;
        if let Some(metadata) = export.class_metadata {
            config.class_metadata = metadata;
        }
        if let Some(analysis) = export.analysis {
            if let Some(enabled) = analysis.compute_retained_size {
                config.compute_retained_size = enabled;
            }
            if let Some(enabled) = analysis.bitmap_correction {
                config.bitmap_correction = enabled;
            }
            if let Some(marker_class) = analysis.marker_class {
                config.marker_class = marker_class;
            }
            if let Some(bitmap_class) = analysis.bitmap_class {
                config.bitmap_class = bitmap_class;
            }
            if let Some(field) = analysis.bitmap_buffer_field {
                config.bitmap_buffer_field = field;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: 1,
            preset: self.preset.to_string(),
            exclusions: self.exclusions.clone(),
            inspectors: self.inspectors.clone(),
            analysis: Some(AnalysisOverrides {
                compute_retained_size: Some(self.compute_retained_size),
                bitmap_correction: Some(self.bitmap_correction),
                marker_class: Some(self.marker_class.clone()),
                bitmap_class: Some(self.bitmap_class.clone()),
                bitmap_buffer_field: Some(self.bitmap_buffer_field.clone()),
            }),
            class_metadata: if self.class_metadata.is_empty() {
                None
            } else {
                Some(self.class_metadata.clone())
            },
        };
        Ok(serde_yaml::to_string(&export)?)
    }
}
