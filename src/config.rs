use crate::constants;
use crate::error::{EtlError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything a run needs to know about where to read from and write to.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub source_url: String,
    pub csv_path: PathBuf,
    pub db_path: PathBuf,
    pub table_name: String,
    pub log_path: PathBuf,
    pub query_threshold: f64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            source_url: constants::SOURCE_URL.to_string(),
            csv_path: PathBuf::from(constants::CSV_PATH),
            db_path: PathBuf::from(constants::DB_PATH),
            table_name: constants::TABLE_NAME.to_string(),
            log_path: PathBuf::from(constants::LOG_PATH),
            query_threshold: constants::QUERY_THRESHOLD,
            request_timeout_secs: constants::REQUEST_TIMEOUT_SECS,
            user_agent: constants::USER_AGENT.to_string(),
        }
    }
}

impl EtlConfig {
    /// Defaults when `path` is `None`, otherwise the TOML file at `path`
    /// layered over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: EtlConfig = toml::from_str(&content)?;
        if !config.query_threshold.is_finite() {
            return Err(EtlError::Config(format!(
                "query_threshold must be a finite number, got {}",
                config.query_threshold
            )));
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
