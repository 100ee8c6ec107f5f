use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

const PROJECT_CONFIG: &str = ".reforge/config.yaml";
const LOCAL_CONFIG: &str = ".reforge/local.yaml";
const ENV_PREFIX: &str = "REFORGE_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid rate limit: {0}. Must be positive")]
    InvalidRateLimit(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid burst_size: {0}. Must be at least 1")]
    InvalidBurstSize(u32),

    #[error("Invalid worker max_concurrency: {0}. Must be at least 1")]
    InvalidConcurrency(usize),

    #[error("Invalid {0} timeout: must be at least 1 second")]
    InvalidTimeout(&'static str),

    #[error("Model name for {0} cannot be empty")]
    EmptyModelName(&'static str),

    #[error("Invalid cancellation ttl_secs: must be at least 1")]
    InvalidCancelTtl,

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `.reforge/config.yaml`
    /// 3. `.reforge/local.yaml`
    /// 4. `REFORGE_*` environment variables, `__` separating nested keys
    pub fn load() -> Result<Config> {
        Self::load_with(None)
    }

    /// Load configuration, replacing the project YAML files with `path` when given.
    pub fn load_with(path: Option<&Path>) -> Result<Config> {
        let config: Config = Self::figment(path)
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a single file, without environment overrides.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(path: Option<&Path>) -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let figment = match path {
            Some(path) => figment.merge(Yaml::file(path)),
            None => figment.merge(Yaml::file(PROJECT_CONFIG)).merge(Yaml::file(LOCAL_CONFIG)),
        };
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(config.logging.rotation.clone()));
        }

        if config.rate_limit.requests_per_second <= 0.0 || !config.rate_limit.requests_per_second.is_finite() {
            return Err(ConfigError::InvalidRateLimit(config.rate_limit.requests_per_second));
        }
        if config.rate_limit.burst_size == 0 {
            return Err(ConfigError::InvalidBurstSize(config.rate_limit.burst_size));
        }

        if config.worker.max_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(config.worker.max_concurrency));
        }

        if config.ai.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("ai.base_url cannot be empty".to_string()));
        }
        if config.ai.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("ai"));
        }
        for (name, model) in [
            ("preferred_model", &config.ai.preferred_model),
            ("fallback_model", &config.ai.fallback_model),
            ("specialized_model", &config.ai.specialized_model),
        ] {
            if model.trim().is_empty() {
                return Err(ConfigError::EmptyModelName(name));
            }
        }

        if config.collaborators.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("collaborators"));
        }
        if config.verification.syntax_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("syntax check"));
        }
        if config.verification.test_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("test"));
        }
        for (language, command) in &config.verification.syntax_checkers {
            if command.is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "Syntax checker command for '{language}' cannot be empty"
                )));
            }
        }

        if config.workspace.root.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("workspace.root cannot be empty".to_string()));
        }
        if config.cancellation.ttl_secs == 0 {
            return Err(ConfigError::InvalidCancelTtl);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::{AiConfig, WorkerConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, ".reforge/reforge.db");
        assert_eq!(config.worker.max_concurrency, 5);
        assert_eq!(config.ai.preferred_model, "codellama");
        assert_eq!(config.cancellation.ttl_secs, 3600);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
worker:
  max_concurrency: 8
ai:
  preferred_model: deepseek-coder
  timeout_secs: 300
verification:
  require_tests: true
  syntax_checkers:
    ruby: [ruby, -c, '{file}']
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.worker.max_concurrency, 8);
        assert_eq!(config.ai.preferred_model, "deepseek-coder");
        assert_eq!(config.ai.fallback_model, "llama3");
        assert!(config.verification.require_tests);
        assert_eq!(config.verification.syntax_checkers["ruby"], vec!["ruby", "-c", "{file}"]);
        assert_eq!(config.logging.format, "json");
        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases: Vec<(Config, fn(&ConfigError) -> bool)> = vec![
            (
                Config {
                    worker: WorkerConfig { max_concurrency: 0 },
                    ..Default::default()
                },
                |e| matches!(e, ConfigError::InvalidConcurrency(0)),
            ),
            (
                Config {
                    ai: AiConfig {
                        fallback_model: " ".into(),
                        ..Default::default()
                    },
                    ..Default::default()
                },
                |e| matches!(e, ConfigError::EmptyModelName("fallback_model")),
            ),
            (
                Config {
                    ai: AiConfig {
                        timeout_secs: 0,
                        ..Default::default()
                    },
                    ..Default::default()
                },
                |e| matches!(e, ConfigError::InvalidTimeout("ai")),
            ),
        ];

        for (config, expected) in cases {
            let err = ConfigLoader::validate(&config).unwrap_err();
            assert!(expected(&err), "unexpected error: {err}");
        }
    }

    #[test]
    fn test_validate_rejects_logging_and_limits() {
        let mut config = Config::default();
        config.logging.level = "verbose".into();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidLogLevel(_))));

        let mut config = Config::default();
        config.logging.rotation = "weekly".into();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidLogRotation(_))));

        let mut config = Config::default();
        config.rate_limit.requests_per_second = 0.0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidRateLimit(_))));

        let mut config = Config::default();
        config.database.path = String::new();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::EmptyDatabasePath)));

        let mut config = Config::default();
        config.cancellation.ttl_secs = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidCancelTtl)));
    }

    #[test]
    fn test_explicit_file_and_env_override() {
        let file = yaml_file("worker:\n  max_concurrency: 3\nai:\n  preferred_model: from-file\n");

        temp_env::with_vars(
            [
                ("REFORGE_WORKER__MAX_CONCURRENCY", Some("7")),
                ("REFORGE_LOGGING__LEVEL", Some("debug")),
            ],
            || {
                let config = ConfigLoader::load_with(Some(file.path())).unwrap();
                assert_eq!(config.worker.max_concurrency, 7, "env wins over file");
                assert_eq!(config.ai.preferred_model, "from-file", "file wins over defaults");
                assert_eq!(config.logging.level, "debug");
            },
        );
    }

    #[test]
    fn test_invalid_env_value_fails_validation() {
        let file = yaml_file("{}\n");
        temp_env::with_var("REFORGE_LOGGING__FORMAT", Some("xml"), || {
            let err = ConfigLoader::load_with(Some(file.path())).unwrap_err();
            assert!(err.to_string().contains("Invalid log format"));
        });
    }

    #[test]
    fn test_hierarchical_merging() {
        let base = yaml_file("worker:\n  max_concurrency: 4\nlogging:\n  level: info\n  format: json\n");
        let overlay = yaml_file("logging:\n  level: warn\n");

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base.path()))
            .merge(Yaml::file(overlay.path()))
            .extract()
            .unwrap();

        assert_eq!(config.logging.level, "warn", "Override should win for nested fields");
        assert_eq!(config.logging.format, "json", "Base value should persist when not overridden");
        assert_eq!(config.worker.max_concurrency, 4);
    }

    #[test]
    fn test_load_from_file() {
        let file = yaml_file("cancellation:\n  ttl_secs: 60\n");
        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.cancellation.ttl_secs, 60);
    }
}
