//! Reachability verdicts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an object on a leak trace is expected to still be in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Reachability {
    /// Expected to be alive
    Reachable,
    /// Expected to have been collected
    Unreachable,
    /// No inspector could tell
    Unknown,
}

impl Reachability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reachability::Reachable => "REACHABLE",
            Reachability::Unreachable => "UNREACHABLE",
            Reachability::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
