//! Project test-suite detection and execution.
//!
//! The candidate is staged into the working copy while the suite runs and
//! the original content is put back afterwards, whether the suite passed,
//! failed, timed out or could not be started.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

use super::failure_text;
use crate::domain::ports::{TestRunner, Verdict, VerificationContext};

/// Resolve the test command for a file from the project layout.
///
/// Returns `None` when no test tooling is recognised for the language.
pub fn detect_test_command(root: &Path, file_path: &str, language: Option<&str>) -> Option<Vec<String>> {
    let stem = Path::new(file_path).file_stem()?.to_string_lossy().into_owned();
    let command = |parts: &[&str]| Some(parts.iter().map(|p| (*p).to_string()).collect::<Vec<_>>());

    match language? {
        "python" => {
            let test_file = format!("test_{stem}.py");
            if root.join("pytest.ini").exists() || root.join("conftest.py").exists() {
                let scoped = format!("tests/{test_file}");
                if root.join(&scoped).exists() {
                    return command(&["python", "-m", "pytest", &scoped, "-v"]);
                }
                return command(&["python", "-m", "pytest"]);
            }
            if root.join(&test_file).exists() {
                return command(&["python", "-m", "unittest", &test_file]);
            }
            None
        }
        "javascript" | "typescript" => {
            if root.join("jest.config.js").exists() || root.join("package.json").exists() {
                return command(&["npm", "test"]);
            }
            None
        }
        "java" => {
            if root.join("pom.xml").exists() {
                return command(&["mvn", "test"]);
            }
            if root.join("build.gradle").exists() {
                return command(&["./gradlew", "test"]);
            }
            None
        }
        _ => None,
    }
}

/// Test runner that detects the project's test command and runs it in the working copy.
pub struct DetectingTestRunner {
    timeout: Duration,
}

impl DetectingTestRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl TestRunner for DetectingTestRunner {
    async fn run_tests(&self, ctx: &VerificationContext) -> Verdict {
        let Some(command) = detect_test_command(&ctx.workspace_root, &ctx.file_path, ctx.language.as_deref()) else {
            tracing::info!(file = %ctx.file_path, "no tests detected");
            return Verdict::Undetermined("no tests found".to_string());
        };

        let path = ctx.absolute_path();
        if let Err(e) = tokio::fs::write(&path, &ctx.candidate).await {
            return Verdict::Fail(format!("Error staging candidate for tests: {e}"));
        }

        tracing::info!(file = %ctx.file_path, command = %command.join(" "), "running tests");
        let verdict = self.execute(&command, &ctx.workspace_root).await;

        if let Err(e) = tokio::fs::write(&path, &ctx.original).await {
            tracing::error!(path = %path.display(), error = %e, "failed to restore original file after test run");
            return Verdict::Fail(format!("Error restoring original after tests: {e}"));
        }
        verdict
    }
}

impl DetectingTestRunner {
    async fn execute(&self, command: &[String], root: &Path) -> Verdict {
        let mut cmd = Command::new(&command[0]);
        cmd.args(&command[1..]).current_dir(root).kill_on_drop(true);

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => Verdict::Fail(format!("Tests timed out after {}s", self.timeout.as_secs())),
            Ok(Err(e)) => Verdict::Fail(format!("Error running tests: {e}")),
            Ok(Ok(output)) if output.status.success() => Verdict::Pass,
            Ok(Ok(output)) => {
                let text = failure_text(&output);
                if text.is_empty() {
                    Verdict::Fail("Tests failed without specific error message".to_string())
                } else {
                    Verdict::Fail(text)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn test_detect_python_commands() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        assert_eq!(detect_test_command(root, "app/models.py", Some("python")), None);

        touch(root, "test_models.py");
        assert_eq!(
            detect_test_command(root, "app/models.py", Some("python")),
            Some(vec!["python".into(), "-m".into(), "unittest".into(), "test_models.py".into()])
        );

        touch(root, "conftest.py");
        assert_eq!(
            detect_test_command(root, "app/models.py", Some("python")),
            Some(vec!["python".into(), "-m".into(), "pytest".into()])
        );

        touch(root, "tests/test_models.py");
        assert_eq!(
            detect_test_command(root, "app/models.py", Some("python")),
            Some(vec!["python".into(), "-m".into(), "pytest".into(), "tests/test_models.py".into(), "-v".into()])
        );
    }

    #[test]
    fn test_detect_js_and_java_commands() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        assert_eq!(detect_test_command(root, "a.ts", Some("typescript")), None);
        touch(root, "package.json");
        assert_eq!(detect_test_command(root, "a.ts", Some("typescript")), Some(vec!["npm".into(), "test".into()]));

        touch(root, "build.gradle");
        assert_eq!(detect_test_command(root, "A.java", Some("java")), Some(vec!["./gradlew".into(), "test".into()]));
        touch(root, "pom.xml");
        assert_eq!(detect_test_command(root, "A.java", Some("java")), Some(vec!["mvn".into(), "test".into()]));

        assert_eq!(detect_test_command(root, "main.go", Some("go")), None);
        assert_eq!(detect_test_command(root, "main.go", None), None);
    }

    #[tokio::test]
    async fn test_no_tests_is_undetermined() {
        let dir = TempDir::new().unwrap();
        let runner = DetectingTestRunner::new(Duration::from_secs(5));
        let ctx = VerificationContext {
            workspace_root: dir.path().to_path_buf(),
            file_path: "lib.rb".to_string(),
            language: Some("ruby".to_string()),
            original: "a".to_string(),
            candidate: "b".to_string(),
        };
        assert!(matches!(runner.run_tests(&ctx).await, Verdict::Undetermined(_)));
    }

    #[tokio::test]
    async fn test_original_restored_after_failed_run() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        // `npm test` either runs the failing script or npm is missing; both are a Fail.
        std::fs::write(root.join("package.json"), r#"{"name":"x","scripts":{"test":"exit 3"}}"#).unwrap();
        std::fs::write(root.join("index.js"), "original").unwrap();

        let runner = DetectingTestRunner::new(Duration::from_secs(60));
        let ctx = VerificationContext {
            workspace_root: root.to_path_buf(),
            file_path: "index.js".to_string(),
            language: Some("javascript".to_string()),
            original: "original".to_string(),
            candidate: "candidate".to_string(),
        };

        assert!(matches!(runner.run_tests(&ctx).await, Verdict::Fail(_)));
        assert_eq!(std::fs::read_to_string(root.join("index.js")).unwrap(), "original");
    }
}
