//! Pipeline configuration.
//!
//! Built once at startup and handed to the pipeline by reference. Layers,
//! lowest precedence first: defaults, optional TOML file, environment
//! variables, then whatever the caller overrides (CLI flags).

use crate::data::provider::SourceMode;
use crate::data::stooq::DEFAULT_ENDPOINT_TEMPLATE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_TICKERS: &str = "TICKERS";
pub const ENV_DATA_SOURCE: &str = "DATA_SOURCE";
pub const ENV_LOCAL_DATA_DIR: &str = "LOCAL_DATA_DIR";
pub const ENV_STOOQ_URL_TEMPLATE: &str = "STOOQ_URL_TEMPLATE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DATABASE_URL is empty. Set it in the environment, .env or --database-url")]
    MissingDatabaseUrl,

    #[error("no tickers configured")]
    NoTickers,

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Store connection target. Required; empty is fatal.
    pub database_url: String,
    /// Uppercased, non-empty ticker symbols, processed in order.
    pub tickers: Vec<String>,
    /// Which extractor to use.
    pub source: SourceMode,
    /// Directory holding `<TICKER>.csv|.xlsx|.xls` in local mode.
    pub local_data_dir: PathBuf,
    /// Remote endpoint; `{symbol}` is replaced by the lowercased ticker.
    pub endpoint_template: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            tickers: vec!["AAPL".to_string()],
            source: SourceMode::Stooq,
            local_data_dir: PathBuf::from("data/raw"),
            endpoint_template: DEFAULT_ENDPOINT_TEMPLATE.to_string(),
        }
    }
}

/// Split a comma-separated ticker list: trim, uppercase, drop blanks.
pub fn parse_tickers(list: &str) -> Vec<String> {
    list.split(',')
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

impl PipelineConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_vars(|key| std::env::var(key).ok())
    }

    /// Load a TOML file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: PipelineConfig = toml::from_str(content)?;
        config.tickers = config
            .tickers
            .iter()
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .collect();
        Ok(config)
    }

    /// Overlay variables from `lookup` (normally the environment) on top of self.
    ///
    /// Unset variables leave the current value alone.
    pub fn with_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            self.database_url = url.trim().to_string();
        }
        if let Some(list) = lookup(ENV_TICKERS) {
            self.tickers = parse_tickers(&list);
        }
        if let Some(mode) = lookup(ENV_DATA_SOURCE) {
            self.source = mode.parse().map_err(|reason| ConfigError::InvalidValue {
                key: ENV_DATA_SOURCE.to_string(),
                reason,
            })?;
        }
        if let Some(dir) = lookup(ENV_LOCAL_DATA_DIR) {
            self.local_data_dir = PathBuf::from(dir.trim());
        }
        if let Some(template) = lookup(ENV_STOOQ_URL_TEMPLATE) {
            self.endpoint_template = template.trim().to_string();
        }
        Ok(self)
    }

    /// Pre-flight checks. Run before any extraction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if self.tickers.is_empty() {
            return Err(ConfigError::NoTickers);
        }
        if self.source == SourceMode::Stooq && !self.endpoint_template.contains("{symbol}") {
            return Err(ConfigError::InvalidValue {
                key: ENV_STOOQ_URL_TEMPLATE.to_string(),
                reason: "template must contain {symbol}".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.tickers, vec!["AAPL"]);
        assert_eq!(cfg.source, SourceMode::Stooq);
        assert_eq!(cfg.local_data_dir, PathBuf::from("data/raw"));
        assert!(cfg.database_url.is_empty());
    }

    #[test]
    fn env_overrides_defaults() {
        let cfg = PipelineConfig::default()
            .with_vars(vars(&[
                ("DATABASE_URL", "sqlite://prices.db"),
                ("TICKERS", " aapl, msft ,,"),
                ("DATA_SOURCE", "local"),
                ("LOCAL_DATA_DIR", "fixtures"),
            ]))
            .unwrap();

        assert_eq!(cfg.database_url, "sqlite://prices.db");
        assert_eq!(cfg.tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(cfg.source, SourceMode::Local);
        assert_eq!(cfg.local_data_dir, PathBuf::from("fixtures"));
    }

    #[test]
    fn unknown_source_is_invalid() {
        let err = PipelineConfig::default()
            .with_vars(vars(&[("DATA_SOURCE", "yahoo")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "DATA_SOURCE"));
    }

    #[test]
    fn empty_database_url_fails_validation() {
        let cfg = PipelineConfig::default()
            .with_vars(vars(&[("DATABASE_URL", "  ")]))
            .unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::MissingDatabaseUrl)));
    }

    #[test]
    fn blank_ticker_list_fails_validation() {
        let cfg = PipelineConfig::default()
            .with_vars(vars(&[("DATABASE_URL", "sqlite::memory:"), ("TICKERS", " , ")]))
            .unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::NoTickers)));
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let cfg = PipelineConfig {
            database_url: "sqlite::memory:".into(),
            endpoint_template: "https://example.com/prices.csv".into(),
            ..PipelineConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn toml_fills_missing_keys_with_defaults() {
        let cfg = PipelineConfig::from_toml(
            r#"
            database_url = "sqlite://etl.db"
            tickers = ["aapl", "msft"]
            source = "local"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(cfg.source, SourceMode::Local);
        assert_eq!(cfg.local_data_dir, PathBuf::from("data/raw"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn env_layers_over_toml() {
        let cfg = PipelineConfig::from_toml("database_url = \"sqlite://a.db\"\n")
            .unwrap()
            .with_vars(vars(&[("DATABASE_URL", "sqlite://b.db")]))
            .unwrap();
        assert_eq!(cfg.database_url, "sqlite://b.db");
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = PipelineConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
