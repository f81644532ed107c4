//! Sources file: aggregator settings plus per-source overrides, in TOML.
//!
//! ```toml
//! [aggregator]
//! strategy = "weighted_average"
//! minimum_sources = 2
//! mock_fallback = true
//!
//! [sources.census]
//! api_key = "..."
//! timeout_ms = 8000
//!
//! [sources.zillow]
//! enabled = false
//! ```
//!
//! Resolution order for a source is built-in defaults, then this file, then
//! `MARKETLENS_<TAG>_*` environment variables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use marketlens_core::adapter::default_adapters;
use marketlens_core::transport::HttpTransport;
use marketlens_core::{DataSource, DataSourceAdapter, DataSourceConfig};

use crate::aggregator::{Aggregator, AggregatorConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Optional per-field overrides for one source. Unset fields keep the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceOverrides {
    pub enabled: Option<bool>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub cache_ttl_ms: Option<u64>,
    pub priority: Option<u32>,
}

impl SourceOverrides {
    pub fn apply(&self, mut config: DataSourceConfig) -> DataSourceConfig {
        if let Some(enabled) = self.enabled {
            config.enabled = enabled;
        }
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            config.api_key = Some(key.clone());
        }
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(attempts) = self.retry_attempts {
            config.retry_attempts = attempts;
        }
        if let Some(ttl) = self.cache_ttl_ms {
            config.cache_ttl_ms = ttl;
        }
        if let Some(priority) = self.priority {
            config.priority = priority;
        }
        config
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesFile {
    pub aggregator: AggregatorConfig,
    /// Keyed by source tag (`census`, `county_assessor`, ...).
    pub sources: BTreeMap<String, SourceOverrides>,
}

impl SourcesFile {
    /// Load and validate a sources file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: SourcesFile = toml::from_str(content)?;
        file.validate()?;
        Ok(file)
    }

    /// Missing file means all defaults.
    pub fn load_optional(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for tag in self.sources.keys() {
            match tag.parse::<DataSource>() {
                Ok(source) if source.is_adapter() => {}
                _ => {
                    return Err(ConfigError::Invalid(format!(
                        "unknown source '{tag}' in [sources]. Valid: census, county_assessor, zillow, realtor, mls"
                    )))
                }
            }
        }
        Ok(())
    }

    fn overrides_for(&self, source: DataSource) -> Option<&SourceOverrides> {
        self.sources
            .iter()
            .find(|(tag, _)| tag.parse::<DataSource>().ok() == Some(source))
            .map(|(_, o)| o)
    }

    /// Defaults, then file overrides, then variables from `env`.
    pub fn config_for_with(
        &self,
        source: DataSource,
        env: &impl Fn(&str) -> Option<String>,
    ) -> DataSourceConfig {
        let defaults = DataSourceConfig::defaults_for(source);
        let from_file = match self.overrides_for(source) {
            Some(overrides) => overrides.apply(defaults),
            None => defaults,
        };
        from_file.apply_env_with(source, env)
    }

    /// Defaults, then file overrides, then the process environment.
    pub fn config_for(&self, source: DataSource) -> DataSourceConfig {
        self.config_for_with(source, &|name: &str| std::env::var(name).ok())
    }

    /// All five adapters with fully layered configs.
    pub fn build_adapters_with(
        &self,
        transport: Arc<dyn HttpTransport>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Vec<Box<dyn DataSourceAdapter>> {
        default_adapters(transport, |source| self.config_for_with(source, &env))
    }

    /// Aggregator over every adapter, reading the process environment.
    pub fn build_aggregator(&self, transport: Arc<dyn HttpTransport>) -> Aggregator {
        let adapters = self.build_adapters_with(transport, |name| std::env::var(name).ok());
        Aggregator::with_adapters(self.aggregator, adapters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::MergeStrategy;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let file = SourcesFile::from_toml("").unwrap();
        assert_eq!(file.aggregator, AggregatorConfig::default());
        assert_eq!(
            file.config_for_with(DataSource::Census, &no_env),
            DataSourceConfig::defaults_for(DataSource::Census)
        );
    }

    #[test]
    fn parses_aggregator_and_source_tables() {
        let file = SourcesFile::from_toml(
            r#"
            [aggregator]
            strategy = "weighted-average"
            minimum_sources = 2
            mock_fallback = true

            [sources.census]
            api_key = "k"
            timeout_ms = 8000

            [sources.county-assessor]
            priority = 1
            "#,
        )
        .unwrap();

        assert_eq!(file.aggregator.strategy, MergeStrategy::WeightedAverage);
        assert_eq!(file.aggregator.minimum_sources, 2);
        assert!(file.aggregator.mock_fallback);

        let census = file.config_for_with(DataSource::Census, &no_env);
        assert_eq!(census.api_key.as_deref(), Some("k"));
        assert_eq!(census.timeout_ms, 8000);
        assert_eq!(census.retry_attempts, 3);

        let county = file.config_for_with(DataSource::CountyAssessor, &no_env);
        assert_eq!(county.priority, 1);
    }

    #[test]
    fn environment_wins_over_file() {
        let file = SourcesFile::from_toml("[sources.zillow]\nenabled = true\n").unwrap();
        let env = |name: &str| (name == "MARKETLENS_ZILLOW_ENABLED").then(|| "false".to_string());
        assert!(!file.config_for_with(DataSource::Zillow, &env).enabled);
    }

    #[test]
    fn rejects_unknown_sources_and_fields() {
        assert!(matches!(
            SourcesFile::from_toml("[sources.redfin]\nenabled = false\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SourcesFile::from_toml("[sources.mock]\nenabled = false\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SourcesFile::from_toml("[sources.census]\ntimeout = 5\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn misspelled_aggregator_keys_are_rejected() {
        assert!(matches!(
            SourcesFile::from_toml("[aggregator]\nminimum_source = 2\n"),
            Err(ConfigError::Parse(_))
        ));
        let file = SourcesFile::from_toml("[aggregator]\nminimum_sources = 2\n").unwrap();
        assert_eq!(file.aggregator.minimum_sources, 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SourcesFile::from_file(Path::new("/nonexistent/marketlens.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
