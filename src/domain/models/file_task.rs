//! Per-file unit of work scheduled into a batch.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

/// A candidate file resolved for transformation.
///
/// Paths are relative to the working-copy root and use `/` separators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTask {
    pub path: String,
    pub language: Option<String>,
    pub size_bytes: u64,
    /// Priority hint from the candidate selector; higher runs first.
    pub priority: Option<f64>,
    /// Opaque metrics hint from the candidate selector.
    pub metrics: Option<serde_json::Value>,
}

impl FileTask {
    pub fn new(path: impl Into<String>, size_bytes: u64) -> Self {
        let path = path.into();
        let language = detect_language(&path).map(str::to_string);
        Self {
            path,
            language,
            size_bytes,
            priority: None,
            metrics: None,
        }
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn language_or_unknown(&self) -> &str {
        self.language.as_deref().unwrap_or("unknown")
    }
}

/// Whether `path` stays inside whatever root it is joined onto.
///
/// Absolute paths, `..`, `.` and drive prefixes are all rejected; only plain
/// name components are accepted.
pub fn is_confined_path(path: &str) -> bool {
    let mut components = Path::new(path).components().peekable();
    components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}

/// Map a file extension to a language name.
pub fn detect_language(path: impl AsRef<Path>) -> Option<&'static str> {
    let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
    let language = match ext.as_str() {
        "py" => "python",
        "js" => "javascript",
        "ts" => "typescript",
        "java" => "java",
        "rb" => "ruby",
        "go" => "go",
        "php" => "php",
        "cs" => "csharp",
        "cpp" => "cpp",
        "c" => "c",
        "html" => "html",
        "css" => "css",
        _ => return None,
    };
    Some(language)
}
