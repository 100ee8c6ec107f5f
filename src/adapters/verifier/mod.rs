//! Local verifier backends: syntax checkers, test runners and static checks.

pub mod additional;
pub mod syntax;
pub mod test_runner;

pub use additional::NonEmptyCandidateCheck;
pub use syntax::CommandSyntaxChecker;
pub use test_runner::{detect_test_command, DetectingTestRunner};

use std::process::Output;

/// Most useful text from a failed command: stderr, else stdout.
fn failure_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        return stderr.trim().to_string();
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
