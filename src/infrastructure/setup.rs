//! Project initialization and runtime wiring.
//!
//! `reforge init` lays down `.reforge/` with a commented config file and a
//! migrated database. [`build_orchestrator`] turns a loaded [`Config`] into a
//! ready [`JobOrchestrator`] with the concrete adapters behind every port.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::adapters::ai::{OllamaBackend, OllamaConfig};
use crate::adapters::http::{HttpCandidateSelector, HttpPatternRepository};
use crate::adapters::memory::{InMemoryMetrics, NullCandidateSelector, NullPatternRepository};
use crate::adapters::sqlite::{
    initialize_database, PoolSettings, SqliteCancellationSignal, SqliteJobRepository, SqliteOutcomeRepository,
};
use crate::adapters::verifier::{CommandSyntaxChecker, DetectingTestRunner, NonEmptyCandidateCheck};
use crate::adapters::LocalWorkspace;
use crate::domain::models::Config;
use crate::domain::ports::{CandidateSelector, GenerationOptions, MetricsSink, PatternRepository};
use crate::services::{
    BatchCoordinator, FileResolver, JobOrchestrator, OrchestratorParts, OrchestratorSettings, TransformationWorker,
    VerificationPipeline, WorkerSettings,
};

/// Default configuration template written by `reforge init`
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Reforge configuration
#
# Values here override the built-in defaults. `.reforge/local.yaml` overrides
# this file, and REFORGE_* environment variables override both, with `__`
# separating nested keys:
#   export REFORGE_AI__PREFERRED_MODEL=deepseek-coder
#   export REFORGE_WORKER__MAX_CONCURRENCY=8

database:
  path: ".reforge/reforge.db"
  max_connections: 5

logging:
  # trace, debug, info, warn, error
  level: "info"
  # json, pretty
  format: "pretty"
  # Uncomment to also write JSON log files (daily, hourly, never)
  # log_dir: ".reforge/logs"
  rotation: "daily"

# Token bucket applied to AI backend requests
rate_limit:
  requests_per_second: 10.0
  burst_size: 20

ai:
  base_url: "http://localhost:11434"
  preferred_model: "codellama"
  fallback_model: "llama3"
  specialized_model: "codellama:34b"
  # Inputs above this size use the specialized model for high-risk kinds
  specialized_threshold_chars: 1000
  timeout_secs: 120
  temperature: 0.2
  top_p: 0.95
  max_tokens: 4096

# Remote services; leave unset to scan the working copy and skip patterns
collaborators:
  # code_analyzer_url: "http://localhost:8081"
  # knowledge_repo_url: "http://localhost:8082"
  timeout_secs: 30
  max_patterns: 3

worker:
  max_concurrency: 5

verification:
  require_tests: false
  syntax_timeout_secs: 60
  test_timeout_secs: 600
  # syntax_checkers:
  #   python: ["python", "-m", "py_compile", "{file}"]

workspace:
  root: ".reforge/workspaces"

cancellation:
  ttl_secs: 3600
"#;

/// Paths managed by `reforge init`
#[derive(Debug, Clone)]
pub struct SetupPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub database_file: PathBuf,
}

impl SetupPaths {
    /// Paths under `root/.reforge`
    pub fn for_root(root: &Path) -> Self {
        let config_dir = root.join(".reforge");
        Self {
            config_file: config_dir.join("config.yaml"),
            database_file: config_dir.join("reforge.db"),
            config_dir,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.config_file.exists() && self.database_file.exists()
    }
}

/// Create the configuration directory
pub fn create_config_dir(paths: &SetupPaths) -> Result<()> {
    fs::create_dir_all(&paths.config_dir).context("Failed to create config directory")
}

/// Write the default configuration file; returns whether it was written.
pub fn create_config_file(paths: &SetupPaths, force: bool) -> Result<bool> {
    if paths.config_file.exists() && !force {
        return Ok(false);
    }

    fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE).context("Failed to write config file")?;
    Ok(true)
}

/// Create or upgrade the project database.
pub async fn run_migrations(paths: &SetupPaths) -> Result<()> {
    let pool = initialize_database(&paths.database_file, PoolSettings::default())
        .await
        .context("Failed to initialize database")?;
    pool.close().await;
    Ok(())
}

/// Build the orchestrator and every adapter behind it.
pub async fn build_orchestrator(config: &Config) -> Result<Arc<JobOrchestrator>> {
    let pool = initialize_database(Path::new(&config.database.path), PoolSettings::from(&config.database))
        .await
        .with_context(|| format!("Failed to open database at {}", config.database.path))?;

    let metrics: Arc<dyn MetricsSink> = Arc::new(InMemoryMetrics::new());

    let ai = OllamaBackend::new(OllamaConfig::from_config(&config.ai, &config.rate_limit))
        .context("Failed to create AI backend")?;

    let collaborators = &config.collaborators;
    let selector: Arc<dyn CandidateSelector> = match &collaborators.code_analyzer_url {
        Some(url) => Arc::new(
            HttpCandidateSelector::new(url.as_str(), collaborators.timeout_secs)
                .context("Failed to create candidate selector client")?,
        ),
        None => {
            debug!("no code analyzer configured, files will come from directory scans");
            Arc::new(NullCandidateSelector)
        }
    };
    let patterns: Arc<dyn PatternRepository> = match &collaborators.knowledge_repo_url {
        Some(url) => Arc::new(
            HttpPatternRepository::new(url.as_str(), collaborators.timeout_secs)
                .context("Failed to create pattern repository client")?,
        ),
        None => {
            debug!("no knowledge repository configured, prompts carry no patterns");
            Arc::new(NullPatternRepository)
        }
    };

    let verification = &config.verification;
    let verifier = Arc::new(VerificationPipeline::new(
        Arc::new(CommandSyntaxChecker::from_config(verification)),
        Arc::new(NonEmptyCandidateCheck),
        Arc::new(DetectingTestRunner::new(Duration::from_secs(verification.test_timeout_secs))),
        Arc::clone(&metrics),
        verification.require_tests,
    ));

    let settings = WorkerSettings {
        generation: GenerationOptions {
            temperature: config.ai.temperature,
            top_p: config.ai.top_p,
            max_tokens: config.ai.max_tokens,
        },
        ai_timeout: Duration::from_secs(config.ai.timeout_secs),
        max_patterns: collaborators.max_patterns,
    };
    let worker = Arc::new(TransformationWorker::new(
        Arc::new(ai),
        patterns,
        verifier,
        Arc::clone(&metrics),
        settings,
    ));

    let parts = OrchestratorParts {
        jobs: Arc::new(SqliteJobRepository::new(pool.clone())),
        outcomes: Arc::new(SqliteOutcomeRepository::new(pool.clone())),
        cancellation: Arc::new(SqliteCancellationSignal::new(pool)),
        workspace: Arc::new(LocalWorkspace::new(&config.workspace.root)),
        resolver: FileResolver::new(selector),
        coordinator: BatchCoordinator::new(worker, config.worker.max_concurrency),
        metrics,
    };
    let settings = OrchestratorSettings {
        ai: config.ai.clone(),
        cancel_ttl: Duration::from_secs(config.cancellation.ttl_secs),
    };

    info!(
        database = %config.database.path,
        workspace = %config.workspace.root,
        max_concurrency = config.worker.max_concurrency,
        "orchestrator ready"
    );
    Ok(Arc::new(JobOrchestrator::new(parts, settings)))
}
