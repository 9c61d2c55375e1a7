//! Screen configuration, stored as TOML.
//!
//! Every field has a built-in default, so an empty file (or no file at all)
//! reproduces the EURO STOXX 50 / Yahoo key-statistics setup.

use crate::data::collect::DEFAULT_MISSING_MARKERS;
use crate::data::http::{HttpClient, DEFAULT_USER_AGENT};
use crate::data::source::{WikipediaSource, DEFAULT_HEADER, DEFAULT_SOURCE_URL};
use crate::data::yahoo::{YahooStatistics, DEFAULT_BASE_URL};
use crate::normalize::{ColumnSpecs, MalformedPolicy, SpecError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "valuescreen.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid {dataset} column table: {source}")]
    Columns {
        dataset: &'static str,
        source: SpecError,
    },

    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Where identifiers come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub header: String,
    /// Which data cell of each row holds the identifier.
    pub identifier_column: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.into(),
            header: DEFAULT_HEADER.into(),
            identifier_column: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Joined rows without a value here are discarded.
    pub required_column: String,
    pub missing_markers: Vec<String>,
    pub malformed: MalformedPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            output_dir: PathBuf::from("output"),
            required_column: "Trailing P/E".into(),
            missing_markers: DEFAULT_MISSING_MARKERS.iter().map(|s| s.to_string()).collect(),
            malformed: MalformedPolicy::Abort,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    pub valuation: ColumnSpecs,
    pub extended: ColumnSpecs,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            valuation: ColumnSpecs::valuation_defaults(),
            extended: ColumnSpecs::extended_defaults(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub source: SourceConfig,
    pub provider: ProviderConfig,
    pub pipeline: PipelineConfig,
    pub columns: ColumnsConfig,
}

impl ScreenConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: ScreenConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.columns
            .valuation
            .validate()
            .map_err(|source| ConfigError::Columns {
                dataset: "valuation",
                source,
            })?;
        self.columns
            .extended
            .validate()
            .map_err(|source| ConfigError::Columns {
                dataset: "extended",
                source,
            })?;
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "provider.timeout_secs must be positive".into(),
            ));
        }
        if self.pipeline.required_column.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "pipeline.required_column must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn http_client(&self) -> HttpClient {
        HttpClient::new(
            Duration::from_secs(self.provider.timeout_secs),
            &self.provider.user_agent,
        )
    }

    pub fn identifier_source(&self) -> WikipediaSource {
        WikipediaSource::new(self.http_client(), &self.source.url, &self.source.header)
            .with_column(self.source.identifier_column)
    }

    pub fn statistics_provider(&self) -> YahooStatistics {
        YahooStatistics::new(self.http_client(), &self.provider.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{ColumnSpec, CoercionMode};

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ScreenConfig::from_toml("").unwrap();
        assert_eq!(config, ScreenConfig::default());
        assert_eq!(config.pipeline.required_column, "Trailing P/E");
        assert_eq!(config.pipeline.malformed, MalformedPolicy::Abort);
    }

    #[test]
    fn toml_roundtrip() {
        let config = ScreenConfig::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[[columns.extended]]"));
        assert_eq!(ScreenConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ScreenConfig::from_toml(
            r#"
            [pipeline]
            malformed = "skip_row"

            [[columns.valuation]]
            raw = "Trailing P/E"
            coerce = "number"
            "#,
        )
        .unwrap();
        assert_eq!(config.pipeline.malformed, MalformedPolicy::SkipRow);
        assert_eq!(config.pipeline.cache_dir, PathBuf::from("cache"));
        assert_eq!(
            config.columns.valuation.iter().collect::<Vec<_>>(),
            vec![&ColumnSpec::coerce("Trailing P/E", CoercionMode::Number)]
        );
        assert_eq!(config.columns.extended, ColumnSpecs::extended_defaults());
    }

    #[test]
    fn chained_rename_is_rejected() {
        let err = ScreenConfig::from_toml(
            r#"
            [[columns.extended]]
            raw = "Payout Ratio 4"
            canonical = "Payout Ratio"

            [[columns.extended]]
            raw = "Payout Ratio"
            canonical = "Payout Ratio %"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Columns { dataset: "extended", .. }));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ScreenConfig::from_toml("[provider]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
