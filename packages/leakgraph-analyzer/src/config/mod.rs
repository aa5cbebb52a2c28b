//! Analyzer configuration
//!
//! - `AnalyzerConfig`: builder-style settings, validated before use
//! - `Preset`: baseline exclusions and inspectors
//! - YAML schema v1 (`io`)

pub mod analyzer_config;
pub mod error;
pub mod io;
pub mod preset;

pub use analyzer_config::AnalyzerConfig;
pub use error::{ConfigError, ConfigResult};
pub use preset::Preset;
