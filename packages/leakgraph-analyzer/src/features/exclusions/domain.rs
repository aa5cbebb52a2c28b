//! Exclusion domain: rules as configured, and the match record attached to
//! a path step.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which references a rule matches
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionPattern {
    /// Instance field `field_name` declared on `class_name` or inherited from it
    InstanceField {
        class_name: String,
        field_name: String,
    },
    /// Static field `field_name` of `class_name`
    StaticField {
        class_name: String,
        field_name: String,
    },
    /// Stack locals of any thread with this name
    Thread { thread_name: String },
    /// Every outgoing reference of instances of `class_name` or a subclass
    Class { class_name: String },
}

impl ExclusionPattern {
    /// Human-readable description shown next to excluded trace elements
    pub fn matching(&self) -> String {
        match self {
            ExclusionPattern::InstanceField {
                class_name,
                field_name,
            } => format!("field {}#{}", class_name, field_name),
            ExclusionPattern::StaticField {
                class_name,
                field_name,
            } => format!("static field {}#{}", class_name, field_name),
            ExclusionPattern::Thread { thread_name } => {
                format!("any threads named {}", thread_name)
            }
            ExclusionPattern::Class { class_name } => format!("any subclass of {}", class_name),
        }
    }
}

/// A configured exclusion rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRule {
    #[serde(flatten)]
    pub pattern: ExclusionPattern,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Matching references are never followed. Otherwise they are followed
    /// only when no path avoids them.
    #[serde(default)]
    pub always_exclude: bool,
}

impl ExclusionRule {
    pub fn new(pattern: ExclusionPattern) -> Self {
        Self {
            pattern,
            name: None,
            reason: None,
            always_exclude: false,
        }
    }

    pub fn to_exclusion(&self) -> Exclusion {
        Exclusion {
            name: self.name.clone(),
            reason: self.reason.clone(),
            always_exclude: self.always_exclude,
            matching: self.pattern.matching(),
        }
    }
}

/// Resolved exclusion carried by path nodes and trace elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub name: Option<String>,
    pub reason: Option<String>,
    pub always_exclude: bool,
    pub matching: String,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.matching)?;
        if let Some(reason) = &self.reason {
            write!(f, " ({})", reason)?;
        }
        Ok(())
    }
}
