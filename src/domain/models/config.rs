use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level settings, one field per YAML section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Job registry and outcome log storage
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Tracing output
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Rate limiting for AI backend requests
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// AI backend and model selection
    #[serde(default)]
    pub ai: AiConfig,

    /// Remote candidate-selector and pattern-repository services
    #[serde(default)]
    pub collaborators: CollaboratorsConfig,

    /// Per-batch worker pool
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Verification ladder commands and policy
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Working-copy placement
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    /// Cancellation signal lifetime
    #[serde(default)]
    pub cancellation: CancellationConfig,
}

/// `SQLite` store shared by every job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Database file, created on first use
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Pool ceiling; jobs running in one process share it
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".reforge/reforge.db".to_string()
}

const fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json` for stderr output
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for `reforge.log`; no file output when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// `daily`, `hourly` or `never`
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Token bucket in front of the AI backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    /// Sustained generate calls per second
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,

    /// Calls allowed back to back before throttling
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

const fn default_requests_per_second() -> f64 {
    10.0
}

const fn default_burst_size() -> u32 {
    20
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
        }
    }
}

/// AI backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AiConfig {
    /// Base URL of the Ollama-compatible generation API
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,

    /// Model tried first for ordinary inputs
    #[serde(default = "default_preferred_model")]
    pub preferred_model: String,

    /// Model tried once when the preferred model yields nothing usable
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,

    /// Model for large inputs of high-risk kinds
    #[serde(default = "default_specialized_model")]
    pub specialized_model: String,

    /// Inputs longer than this many characters count as large
    #[serde(default = "default_specialized_threshold")]
    pub specialized_threshold_chars: usize,

    /// Per-call timeout in seconds
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_ai_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_preferred_model() -> String {
    "codellama".to_string()
}

fn default_fallback_model() -> String {
    "llama3".to_string()
}

fn default_specialized_model() -> String {
    "codellama:34b".to_string()
}

const fn default_specialized_threshold() -> usize {
    1000
}

const fn default_ai_timeout_secs() -> u64 {
    120
}

const fn default_temperature() -> f32 {
    0.2
}

const fn default_top_p() -> f32 {
    0.95
}

const fn default_max_tokens() -> u32 {
    4096
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: default_ai_base_url(),
            preferred_model: default_preferred_model(),
            fallback_model: default_fallback_model(),
            specialized_model: default_specialized_model(),
            specialized_threshold_chars: default_specialized_threshold(),
            timeout_secs: default_ai_timeout_secs(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Remote collaborator services. Unset URLs disable the collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CollaboratorsConfig {
    /// Base URL of the code-analyzer candidate selector
    #[serde(default)]
    pub code_analyzer_url: Option<String>,

    /// Base URL of the knowledge pattern repository
    #[serde(default)]
    pub knowledge_repo_url: Option<String>,

    /// HTTP timeout for collaborator calls in seconds
    #[serde(default = "default_collaborator_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum reference patterns embedded in a prompt
    #[serde(default = "default_max_patterns")]
    pub max_patterns: usize,
}

const fn default_collaborator_timeout_secs() -> u64 {
    30
}

const fn default_max_patterns() -> usize {
    3
}

impl Default for CollaboratorsConfig {
    fn default() -> Self {
        Self {
            code_analyzer_url: None,
            knowledge_repo_url: None,
            timeout_secs: default_collaborator_timeout_secs(),
            max_patterns: default_max_patterns(),
        }
    }
}

/// Worker pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkerConfig {
    /// Maximum in-flight transformations per batch
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

const fn default_max_concurrency() -> usize {
    5
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// Verification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VerificationConfig {
    /// Syntax checker command per language; `{file}` is replaced by the candidate path
    #[serde(default = "default_syntax_checkers")]
    pub syntax_checkers: BTreeMap<String, Vec<String>>,

    /// Fail the test stage when no test command can be detected
    #[serde(default)]
    pub require_tests: bool,

    /// Timeout for a syntax checker run in seconds
    #[serde(default = "default_syntax_timeout_secs")]
    pub syntax_timeout_secs: u64,

    /// Timeout for a test suite run in seconds
    #[serde(default = "default_test_timeout_secs")]
    pub test_timeout_secs: u64,
}

fn default_syntax_checkers() -> BTreeMap<String, Vec<String>> {
    let command = |parts: &[&str]| parts.iter().map(|p| (*p).to_string()).collect::<Vec<_>>();
    BTreeMap::from([
        ("python".to_string(), command(&["python", "-m", "py_compile", "{file}"])),
        ("javascript".to_string(), command(&["node", "--check", "{file}"])),
        ("typescript".to_string(), command(&["tsc", "--noEmit", "{file}"])),
        ("java".to_string(), command(&["javac", "-Xlint:all", "{file}"])),
    ])
}

const fn default_syntax_timeout_secs() -> u64 {
    60
}

const fn default_test_timeout_secs() -> u64 {
    600
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            syntax_checkers: default_syntax_checkers(),
            require_tests: false,
            syntax_timeout_secs: default_syntax_timeout_secs(),
            test_timeout_secs: default_test_timeout_secs(),
        }
    }
}

/// Working-copy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkspaceConfig {
    /// Directory under which per-job working copies are created
    #[serde(default = "default_workspace_root")]
    pub root: String,
}

fn default_workspace_root() -> String {
    ".reforge/workspaces".to_string()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_workspace_root(),
        }
    }
}

/// Cancellation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CancellationConfig {
    /// Lifetime of a raised cancellation signal in seconds
    #[serde(default = "default_cancel_ttl_secs")]
    pub ttl_secs: u64,
}

const fn default_cancel_ttl_secs() -> u64 {
    3600
}

impl Default for CancellationConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cancel_ttl_secs(),
        }
    }
}
