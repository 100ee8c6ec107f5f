//! Table output for jobs and outcomes using comfy-table.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use super::truncate;
use crate::domain::models::JobStatus;

/// Table with UTF-8 borders and bold headers.
pub fn create_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.iter().map(|h| Cell::new(h).add_attribute(Attribute::Bold)));
    table
}

/// Colored cell for a job status, or an icon when colors are off.
pub fn job_status_cell(status: &str) -> Cell {
    let parsed = JobStatus::from_str(status);
    if supports_color() {
        match parsed {
            Some(status) => Cell::new(status.as_str()).fg(status_color(status)),
            None => Cell::new(status),
        }
    } else {
        let icon = parsed.map_or("?", status_icon);
        Cell::new(format!("{icon} {status}"))
    }
}

/// Colored cell for an outcome label (`success`, `applied_with_errors`, `failed`).
pub fn outcome_cell(label: &str) -> Cell {
    if !supports_color() {
        return Cell::new(label);
    }
    let color = match label {
        "success" => Color::Green,
        "applied_with_errors" => Color::Yellow,
        _ => Color::Red,
    };
    Cell::new(label).fg(color)
}

pub fn text_cell(text: &str, max_chars: usize) -> Cell {
    Cell::new(truncate(text, max_chars))
}

/// Check if color output is supported
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }
    console::colors_enabled()
}

fn status_color(status: JobStatus) -> Color {
    match status {
        JobStatus::Pending => Color::White,
        JobStatus::Running => Color::Cyan,
        JobStatus::Completed => Color::Green,
        JobStatus::Failed => Color::Red,
        JobStatus::Cancelled => Color::DarkGrey,
    }
}

fn status_icon(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Pending => "○",
        JobStatus::Running => "⟳",
        JobStatus::Completed => "✓",
        JobStatus::Failed => "✗",
        JobStatus::Cancelled => "⊘",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_renders_rows() {
        let mut table = create_table(&["File", "Status"]);
        table.add_row(vec![text_cell("src/app.py", 40), outcome_cell("success")]);
        let rendered = table.to_string();
        assert!(rendered.contains("File"));
        assert!(rendered.contains("src/app.py"));
    }

    #[test]
    fn test_every_status_has_icon() {
        for status in JobStatus::ALL {
            assert!(!status_icon(status).is_empty());
        }
    }
}
