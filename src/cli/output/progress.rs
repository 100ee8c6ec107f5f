//! Job progress display using indicatif.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files {msg}";
const PROGRESS_CHARS: &str = "█▓▒░ ";

/// Progress bar over a job's files; hidden in JSON mode.
pub fn create_job_progress(json_mode: bool) -> ProgressBar {
    if json_mode {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template(PROGRESS_TEMPLATE)
        .map(|style| style.progress_chars(PROGRESS_CHARS))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub trait ProgressBarExt {
    /// Finish with a success message (checkmark)
    fn finish_success(&self, message: impl Into<String>);

    /// Finish with an error message (cross)
    fn finish_error(&self, message: impl Into<String>);

    /// Finish with a warning message
    fn finish_warning(&self, message: impl Into<String>);
}

impl ProgressBarExt for ProgressBar {
    fn finish_success(&self, message: impl Into<String>) {
        self.finish_with_message(format!("✓ {}", message.into()));
    }

    fn finish_error(&self, message: impl Into<String>) {
        self.finish_with_message(format!("✗ {}", message.into()));
    }

    fn finish_warning(&self, message: impl Into<String>) {
        self.finish_with_message(format!("! {}", message.into()));
    }
}
