//! Preset configurations
//!
//! A preset picks the baseline exclusion set and reachability inspectors.
//! Rules and inspectors from the config file are layered on top.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{ConfigError, ConfigResult};
use crate::features::exclusions::{android_defaults, jvm_defaults, ExcludedRefsBuilder};
use crate::features::reachability::{BuiltinInspector, InspectorSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Android framework exclusions, all built-in inspectors, bitmap correction
    #[default]
    Android,

    /// Reference types and finalizer threads only; main-thread inspector
    Jvm,

    /// Nothing excluded, no inspectors
    None,
}

impl Preset {
    pub fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "android" => Ok(Self::Android),
            "jvm" => Ok(Self::Jvm),
            "none" => Ok(Self::None),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Jvm => "jvm",
            Self::None => "none",
        }
    }

    pub fn excluded_refs(&self) -> ExcludedRefsBuilder {
        match self {
            Self::Android => android_defaults(),
            Self::Jvm => jvm_defaults(),
            Self::None => ExcludedRefsBuilder::new(),
        }
    }

    pub fn inspectors(&self) -> Vec<InspectorSpec> {
        match self {
            Self::Android => BuiltinInspector::ALL
                .into_iter()
                .map(InspectorSpec::Builtin)
                .collect(),
            Self::Jvm => vec![InspectorSpec::Builtin(BuiltinInspector::MainThread)],
            Self::None => Vec::new(),
        }
    }

    /// Native bitmap buffers only exist on Android heaps
    pub fn bitmap_correction(&self) -> bool {
        matches!(self, Self::Android)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
