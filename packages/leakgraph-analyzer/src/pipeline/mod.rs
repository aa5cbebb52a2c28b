//! Analysis pipeline: the `HeapAnalyzer` entry point, progress reporting and
//! result rendering

pub mod analyzer;
pub mod progress;
pub mod report;
pub mod result;

pub use analyzer::{AnalysisOptions, HeapAnalyzer};
pub use progress::{AnalyzerStep, LoggingProgressListener, NoopProgressListener, ProgressListener};
pub use report::{format_size, render_json, render_text};
pub use result::{AnalysisResult, RetainedSize};
