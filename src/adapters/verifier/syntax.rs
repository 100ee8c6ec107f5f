//! Command-based syntax checking.
//!
//! The candidate is written into a fresh temporary directory under its
//! original file name and the language's configured command is run against
//! it. The directory is removed when the check finishes, pass or fail.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;

use super::failure_text;
use crate::domain::models::VerificationConfig;
use crate::domain::ports::{SyntaxChecker, Verdict, VerificationContext};

const FILE_PLACEHOLDER: &str = "{file}";

pub struct CommandSyntaxChecker {
    commands: BTreeMap<String, Vec<String>>,
    timeout: Duration,
}

impl CommandSyntaxChecker {
    pub fn new(commands: BTreeMap<String, Vec<String>>, timeout: Duration) -> Self {
        Self { commands, timeout }
    }

    pub fn from_config(config: &VerificationConfig) -> Self {
        Self::new(config.syntax_checkers.clone(), Duration::from_secs(config.syntax_timeout_secs))
    }

    fn command_for(&self, language: &str) -> Option<&[String]> {
        self.commands.get(language).map(Vec::as_slice).filter(|c| !c.is_empty())
    }

    /// Expand `{file}` in the arguments, appending the path if no argument uses it.
    fn expand_args(template: &[String], file: &Path) -> Vec<String> {
        let file = file.to_string_lossy();
        let mut args: Vec<String> = template.iter().map(|a| a.replace(FILE_PLACEHOLDER, &file)).collect();
        if !template.iter().any(|a| a.contains(FILE_PLACEHOLDER)) {
            args.push(file.into_owned());
        }
        args
    }

    async fn run_in_scratch(&self, command: &[String], ctx: &VerificationContext) -> Verdict {
        let scratch = match TempDir::new() {
            Ok(dir) => dir,
            Err(e) => return Verdict::Fail(format!("Error during syntax check: {e}")),
        };

        let file_name = Path::new(&ctx.file_path)
            .file_name()
            .map_or_else(|| "candidate".into(), |n| n.to_os_string());
        let candidate_path = scratch.path().join(file_name);
        if let Err(e) = tokio::fs::write(&candidate_path, &ctx.candidate).await {
            return Verdict::Fail(format!("Error during syntax check: {e}"));
        }

        let (program, template) = (&command[0], &command[1..]);
        let mut cmd = Command::new(program);
        cmd.args(Self::expand_args(template, &candidate_path))
            .current_dir(scratch.path())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => Verdict::Fail(format!("Syntax check timed out after {}s", self.timeout.as_secs())),
            Ok(Err(e)) => {
                tracing::error!(program = %program, error = %e, "failed to spawn syntax checker");
                Verdict::Fail(format!("Failed to run syntax checker '{program}': {e}"))
            }
            Ok(Ok(output)) if output.status.success() => Verdict::Pass,
            Ok(Ok(output)) => Verdict::Fail(format!("Syntax check failed: {}", failure_text(&output))),
        }
    }
}

#[async_trait]
impl SyntaxChecker for CommandSyntaxChecker {
    async fn check_syntax(&self, ctx: &VerificationContext) -> Verdict {
        let Some(language) = ctx.language.as_deref() else {
            return Verdict::Undetermined("no language detected".to_string());
        };
        let Some(command) = self.command_for(language) else {
            tracing::warn!(language, file = %ctx.file_path, "syntax verification not configured for language");
            return Verdict::Undetermined(format!("no syntax checker configured for {language}"));
        };

        tracing::debug!(language, file = %ctx.file_path, program = %command[0], "running syntax check");
        self.run_in_scratch(command, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn checker(language: &str, command: &[&str]) -> CommandSyntaxChecker {
        let commands = BTreeMap::from([(
            language.to_string(),
            command.iter().map(|s| (*s).to_string()).collect(),
        )]);
        CommandSyntaxChecker::new(commands, Duration::from_secs(10))
    }

    fn ctx(language: Option<&str>, candidate: &str) -> VerificationContext {
        VerificationContext {
            workspace_root: PathBuf::from("/nonexistent"),
            file_path: "pkg/module.py".to_string(),
            language: language.map(str::to_string),
            original: "x = 0\n".to_string(),
            candidate: candidate.to_string(),
        }
    }

    #[test]
    fn test_expand_args() {
        let file = Path::new("/tmp/x/a.py");
        let with_placeholder = vec!["-m".to_string(), "py_compile".to_string(), "{file}".to_string()];
        assert_eq!(
            CommandSyntaxChecker::expand_args(&with_placeholder, file),
            vec!["-m", "py_compile", "/tmp/x/a.py"]
        );
        assert_eq!(CommandSyntaxChecker::expand_args(&["--check".to_string()], file), vec!["--check", "/tmp/x/a.py"]);
    }

    #[tokio::test]
    async fn test_unconfigured_language_is_undetermined() {
        let checker = checker("python", &["true"]);
        assert!(matches!(checker.check_syntax(&ctx(Some("ruby"), "x")).await, Verdict::Undetermined(_)));
        assert!(matches!(checker.check_syntax(&ctx(None, "x")).await, Verdict::Undetermined(_)));
    }

    #[tokio::test]
    async fn test_command_sees_candidate_under_original_name() {
        let checker = checker("python", &["sh", "-c", "test \"$(basename {file})\" = module.py && grep -q 'x = 1' {file}"]);
        assert_eq!(checker.check_syntax(&ctx(Some("python"), "x = 1\n")).await, Verdict::Pass);
        assert!(matches!(checker.check_syntax(&ctx(Some("python"), "y = 2\n")).await, Verdict::Fail(_)));
    }

    #[tokio::test]
    async fn test_failure_reports_stderr() {
        let checker = checker("python", &["sh", "-c", "echo 'SyntaxError: bad' >&2; exit 1"]);
        match checker.check_syntax(&ctx(Some("python"), "def (")).await {
            Verdict::Fail(msg) => assert!(msg.contains("SyntaxError: bad"), "{msg}"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_scratch_directory_is_removed() {
        let record = tempfile::NamedTempFile::new().unwrap();
        let script = format!("dirname {{file}} > {}; exit 1", record.path().display());
        let checker = checker("python", &["sh", "-c", &script]);

        let verdict = checker.check_syntax(&ctx(Some("python"), "x")).await;
        assert!(matches!(verdict, Verdict::Fail(_)));

        let scratch = std::fs::read_to_string(record.path()).unwrap();
        assert!(!Path::new(scratch.trim()).exists());
    }

    #[tokio::test]
    async fn test_missing_checker_binary_fails() {
        let checker = checker("python", &["definitely-not-a-real-checker-binary"]);
        assert!(matches!(checker.check_syntax(&ctx(Some("python"), "x")).await, Verdict::Fail(_)));
    }
}
