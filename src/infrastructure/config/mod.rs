//! Layered configuration for reforge.
//!
//! Built-in defaults, then `.reforge/config.yaml` and `.reforge/local.yaml`
//! (or a single `--config` file), then `REFORGE_*` environment overrides.
//! Every loaded [`Config`](crate::domain::models::Config) is validated before use.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
