//! Before/after size metrics for a rewrite.

use crate::domain::models::{ComplexityReport, ComplexityStats};

pub fn measure(code: &str) -> ComplexityStats {
    let total_lines = code.lines().count() as u64;
    let non_empty_lines = code.lines().filter(|l| !l.trim().is_empty()).count() as u64;
    let characters = code.chars().count() as u64;
    let average_line_length = if total_lines == 0 {
        0.0
    } else {
        characters as f64 / total_lines as f64
    };

    ComplexityStats {
        total_lines,
        non_empty_lines,
        characters,
        average_line_length,
    }
}

/// Percentage reduction from `before` to `after`; negative when the code grew.
fn reduction_pct(before: u64, after: u64) -> f64 {
    if before == 0 {
        return 0.0;
    }
    (before as f64 - after as f64) / before as f64 * 100.0
}

pub fn compare(original: &str, transformed: &str) -> ComplexityReport {
    let before = measure(original);
    let after = measure(transformed);

    ComplexityReport {
        before,
        after,
        line_change_pct: reduction_pct(before.total_lines, after.total_lines),
        char_change_pct: reduction_pct(before.characters, after.characters),
        is_smaller: after.characters < before.characters,
    }
}
