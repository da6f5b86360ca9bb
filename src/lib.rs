pub mod collaborators;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod diff;
pub mod errors;
pub mod export;
pub mod history;
pub mod models;
pub mod registry;
pub mod service;
pub mod validation;

#[cfg(test)]
mod testing;

pub use crate::config::LedgerSettings;
pub use crate::dashboard::{CountBucket, DashboardAggregate, Tally};
pub use crate::db::Database;
pub use crate::errors::{AppError, AppResult};
pub use crate::models::{
    AssetId, AssetRecord, AssetStatus, Category, CategoryId, ExportFormat, ExportResponse, FieldValues, HistoryEntry,
    ListAssetsFilters, RawInput, SubmitOutcome, UserAccount, UserId,
};
pub use crate::service::AssetService;

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// Loads settings, starts file logging and opens the asset database.
pub fn bootstrap(settings_path: &Path) -> AppResult<AssetService> {
    let settings = LedgerSettings::load(settings_path)?;
    std::fs::create_dir_all(&settings.data_dir)?;
    if let Err(error) = init_tracing(&settings.log_dir(), &settings.log_filter, &settings.log_file_prefix) {
        // A subscriber installed by the host keeps working.
        tracing::warn!(error = %error, "file logging not initialized");
    }
    tracing::info!(data_dir = %settings.data_dir.to_string_lossy(), "asset ledger starting");
    AssetService::open(settings)
}

/// Daily-rolling JSON logs under `log_dir`. `RUST_LOG` overrides `filter`.
pub fn init_tracing(log_dir: &Path, filter: &str, file_prefix: &str) -> AppResult<()> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| AppError::Internal(error.to_string()))
}
