//! Text and JSON rendering of an `AnalysisResult`

use super::result::{AnalysisResult, RetainedSize};
use crate::errors::Result;

/// Human-readable size, e.g. `1.5 KB`
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Summary in the layout developers paste into bug reports
///
/// `details` appends the field dump of every trace element.
pub fn render_text(result: &AnalysisResult, details: bool) -> String {
    let mut out = String::new();
    match result {
        AnalysisResult::NoLeak { class_name, .. } => {
            out.push_str(&format!("* NO LEAK FOUND for {}.\n", class_name));
        }
        AnalysisResult::LeakFound {
            excluded_leak,
            class_name,
            leak_trace,
            retained_heap_size,
            ..
        } => {
            if *excluded_leak {
                out.push_str("* EXCLUDED LEAK.\n");
            }
            out.push_str(&format!("* {} has leaked:\n", class_name));
            out.push_str(&leak_trace.to_string());
            if let RetainedSize::Bytes(bytes) = retained_heap_size {
                out.push_str(&format!("* Retaining: {}.\n", format_size(*bytes)));
            }
            if let Some(exclusion) = leak_trace.elements.iter().find_map(|e| e.exclusion.as_ref()) {
                out.push_str(&format!("* Leak excluded: {}\n", exclusion));
            }
            if details {
                out.push_str("* Details:\n");
                out.push_str(&leak_trace.to_detailed_string());
            }
        }
        AnalysisResult::Failure { error, .. } => {
            out.push_str(&format!("* FAILURE in analysis: {}\n", error));
        }
    }
    out.push_str(&format!(
        "* Analysis took {} ms\n",
        result.analysis_duration_ms()
    ));
    out
}

pub fn render_json(result: &AnalysisResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}
