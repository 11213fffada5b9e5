//! Configuration Loader
//!
//! Environment-aware layered loading: built-in defaults, `fleet-dispatch.toml`, an
//! environment-specific overlay and finally `FLEET_DISPATCH__*` environment variables.

use super::error::ConfigResult;
use super::OrchestratorConfig;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

const BASE_FILE_STEM: &str = "fleet-dispatch";
const ENV_PREFIX: &str = "FLEET_DISPATCH";
const ENV_SEPARATOR: &str = "__";

pub struct ConfigLoader {
    config_directory: PathBuf,
    environment: String,
    env_source: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Loader for `config_directory` with the environment auto-detected
    pub fn new(config_directory: impl Into<PathBuf>) -> Self {
        Self {
            config_directory: config_directory.into(),
            environment: Self::detect_environment(),
            env_source: None,
        }
    }

    /// Override the detected environment name
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into().to_lowercase();
        self
    }

    /// Read variable overrides from `vars` instead of the process environment
    pub fn with_env_source(mut self, vars: HashMap<String, String>) -> Self {
        self.env_source = Some(vars);
        self
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn load(&self) -> ConfigResult<OrchestratorConfig> {
        let base = self.config_file(BASE_FILE_STEM);
        let overlay = self.config_file(&format!("{BASE_FILE_STEM}.{}", self.environment));

        debug!(
            environment = %self.environment,
            base = %base.display(),
            overlay = %overlay.display(),
            "Loading orchestrator configuration"
        );

        let settings = Config::builder()
            .add_source(Config::try_from(&OrchestratorConfig::default())?)
            .add_source(File::from(base).format(FileFormat::Toml).required(false))
            .add_source(File::from(overlay).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .source(self.env_source.clone()),
            )
            .build()?;

        let config: OrchestratorConfig = settings.try_deserialize()?;
        config.validate()?;

        debug!(
            poll_interval_ms = config.poll_interval_ms,
            readiness_timeout_seconds = config.readiness_timeout_seconds,
            policy = ?config.readiness_failure_policy,
            "Orchestrator configuration loaded"
        );

        Ok(config)
    }

    fn config_file(&self, stem: &str) -> PathBuf {
        Path::new(&self.config_directory).join(format!("{stem}.toml"))
    }

    fn detect_environment() -> String {
        env::var("FLEET_DISPATCH_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReadinessFailurePolicy;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_files_yield_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::new(dir.path())
            .with_environment("test")
            .with_env_source(HashMap::new())
            .load()
            .unwrap();

        assert_eq!(config, OrchestratorConfig::default());
    }

    #[test]
    fn test_environment_overlay_wins_over_base() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("fleet-dispatch.toml"),
            "poll_interval_ms = 5000\nreadiness_timeout_seconds = 120\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("fleet-dispatch.test.toml"),
            "poll_interval_ms = 10\nreadiness_failure_policy = \"proceed\"\n",
        )
        .unwrap();

        let config = ConfigLoader::new(dir.path())
            .with_environment("test")
            .with_env_source(HashMap::new())
            .load()
            .unwrap();

        assert_eq!(config.poll_interval_ms, 10);
        assert_eq!(config.readiness_timeout_seconds, 120);
        assert_eq!(
            config.readiness_failure_policy,
            ReadinessFailurePolicy::Proceed
        );
    }

    #[test]
    fn test_env_variables_override_files() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("fleet-dispatch.toml"),
            "max_output_keys = 50\n",
        )
        .unwrap();

        let vars = HashMap::from([(
            "FLEET_DISPATCH__MAX_OUTPUT_KEYS".to_string(),
            "25".to_string(),
        )]);
        let config = ConfigLoader::new(dir.path())
            .with_environment("production")
            .with_env_source(vars)
            .load()
            .unwrap();

        assert_eq!(config.max_output_keys, 25);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("fleet-dispatch.toml"), "poll_interval_ms = 0\n").unwrap();

        let result = ConfigLoader::new(dir.path())
            .with_environment("test")
            .with_env_source(HashMap::new())
            .load();

        assert!(result.is_err());
    }
}
