use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerSettings {
    pub data_dir: PathBuf,
    pub database_file: String,
    pub log_filter: String,
    pub log_file_prefix: String,
    pub history_date_format: String,
    pub title_padding: usize,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("asset-ledger-data"),
            database_file: "assets.sqlite".to_string(),
            log_filter: "info".to_string(),
            log_file_prefix: "asset-ledger.log".to_string(),
            history_date_format: "%Y-%m-%d %H:%M".to_string(),
            title_padding: 5,
        }
    }
}

impl LedgerSettings {
    /// Reads YAML settings; a missing file yields the defaults.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.to_string_lossy(), "settings file not found; using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> AppResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn export_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    fn validate(&self) -> AppResult<()> {
        if self.database_file.trim().is_empty() {
            return Err(AppError::Config("databaseFile cannot be empty".to_string()));
        }
        if self.title_padding == 0 || self.title_padding > 12 {
            return Err(AppError::Config(format!(
                "titlePadding must be between 1 and 12, got {}",
                self.title_padding
            )));
        }
        Ok(())
    }
}
