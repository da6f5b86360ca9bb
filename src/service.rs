use crate::collaborators::{ActorClock, CategoryDirectory, IdentityDirectory, RecordStore, SystemClock};
use crate::config::LedgerSettings;
use crate::dashboard::{aggregate, DashboardAggregate};
use crate::db::Database;
use crate::diff::{coerce_user_id, SaveEngine};
use crate::errors::{AppError, AppResult};
use crate::export::{headers, project_row, render};
use crate::history::{render_line, HistoryLog};
use crate::models::{
    AssetId, AssetRecord, Category, ExportFormat, ExportResponse, HistoryEntry, ListAssetsFilters, RawInput,
    SubmitOutcome, UserAccount, UserId,
};
use crate::registry::{ASSET_TAG, ISSUED_TO};
use crate::validation::validate;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static SEQUENTIAL_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0*(\d+)$").expect("valid sequential title regex"));

/// Next zero-padded title after the largest all-digit title in `titles`.
pub fn next_sequential_title(titles: &[String], padding: usize) -> AppResult<String> {
    let last = titles
        .iter()
        .filter_map(|title| SEQUENTIAL_TITLE_RE.captures(title))
        .filter_map(|captures| captures.get(1)?.as_str().parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    let next = last
        .checked_add(1)
        .ok_or_else(|| AppError::InvalidInput(format!("No sequential title follows {}", last)))?;
    Ok(format!("{:0width$}", next, width = padding))
}

pub fn fallback_title(id: AssetId, asset_tag: &str) -> String {
    let tag = asset_tag.trim();
    if tag.is_empty() {
        format!("Asset #{}", id)
    } else {
        format!("Asset: {}", tag)
    }
}

#[derive(Clone)]
pub struct AssetService {
    db: Arc<Database>,
    settings: LedgerSettings,
}

impl AssetService {
    pub fn open(settings: LedgerSettings) -> AppResult<Self> {
        let db = Arc::new(Database::new(&settings.database_path())?);
        Ok(Self::new(db, settings))
    }

    pub fn new(db: Arc<Database>, settings: LedgerSettings) -> Self {
        Self { db, settings }
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    pub fn create_asset(&self, title: Option<&str>) -> AppResult<AssetRecord> {
        let title = match title.map(str::trim).filter(|title| !title.is_empty()) {
            Some(title) => title.to_string(),
            None => next_sequential_title(&self.db.list_titles()?, self.settings.title_padding)?,
        };
        let asset = self.db.create_asset(&title)?;
        tracing::info!(asset_id = asset.id, title = %asset.title, "asset created");
        Ok(asset)
    }

    pub fn get_asset(&self, asset_id: AssetId) -> AppResult<Option<AssetRecord>> {
        self.db.get_asset(asset_id)
    }

    pub fn submit(&self, asset_id: AssetId, raw: &RawInput, actor: UserId) -> AppResult<SubmitOutcome> {
        self.submit_with_clock(asset_id, raw, &SystemClock::new(actor))
    }

    /// Validates, then saves. Input with any validation error writes nothing.
    pub fn submit_with_clock(
        &self,
        asset_id: AssetId,
        raw: &RawInput,
        clock: &dyn ActorClock,
    ) -> AppResult<SubmitOutcome> {
        let errors = validate(raw);
        if !errors.is_empty() {
            return Ok(SubmitOutcome::Rejected { errors });
        }

        let db = self.db.as_ref();
        let current = db.get(asset_id)?;
        let current_category = db.current_category_of(asset_id)?;
        let changes = SaveEngine::new(db, db, db, clock).save(asset_id, raw, &current, current_category)?;

        self.ensure_title(asset_id)?;
        Ok(SubmitOutcome::Saved { changes })
    }

    fn ensure_title(&self, asset_id: AssetId) -> AppResult<()> {
        let Some(asset) = self.db.get_asset(asset_id)? else {
            return Err(AppError::NotFound(format!("Asset {} not found", asset_id)));
        };
        if asset.title.trim().is_empty() {
            self.db.set_title(asset_id, &fallback_title(asset_id, asset.value(ASSET_TAG)))?;
        }
        Ok(())
    }

    pub fn history(&self, asset_id: AssetId) -> AppResult<Vec<HistoryEntry>> {
        HistoryLog::new(self.db.as_ref()).read(asset_id)
    }

    pub fn history_lines(&self, asset_id: AssetId) -> AppResult<Vec<String>> {
        let entries = self.history(asset_id)?;
        Ok(entries
            .iter()
            .map(|entry| render_line(entry, self.db.as_ref(), &self.settings.history_date_format))
            .collect())
    }

    pub fn dashboard(&self) -> AppResult<DashboardAggregate> {
        let records = RecordStore::list_all(self.db.as_ref())?;
        let categories = CategoryDirectory::list_all(self.db.as_ref())?;
        Ok(aggregate(&records, &categories, self.db.as_ref()))
    }

    pub fn export_rows(&self) -> AppResult<Vec<Vec<String>>> {
        let assets = self.db.list_assets(&ListAssetsFilters::default())?;
        Ok(assets
            .iter()
            .map(|asset| {
                let user_name = match coerce_user_id(asset.value(ISSUED_TO)) {
                    0 => None,
                    id => self.db.resolve_display_name(id),
                };
                let category_names: Vec<String> = asset
                    .category
                    .and_then(|category| self.db.resolve_name(category))
                    .into_iter()
                    .collect();
                project_row(asset, user_name.as_deref(), &category_names)
            })
            .collect())
    }

    pub fn export_assets(&self, format: &str) -> AppResult<ExportResponse> {
        let format = ExportFormat::parse(format)?;
        let rows = self.export_rows()?;
        let contents = render(format, &headers(), &rows)?;

        let export_dir = self.settings.export_dir();
        std::fs::create_dir_all(&export_dir)?;
        let output_path = export_dir.join(format!(
            "assets-{}.{}",
            Utc::now().format("%Y-%m-%d"),
            format.extension()
        ));
        std::fs::write(&output_path, contents)?;

        tracing::info!(path = %output_path.to_string_lossy(), rows = rows.len(), "assets exported");
        Ok(ExportResponse {
            path: output_path.to_string_lossy().to_string(),
            row_count: rows.len(),
        })
    }

    pub fn list_assets(&self, filters: &ListAssetsFilters) -> AppResult<Vec<AssetRecord>> {
        self.db.list_assets(filters)
    }

    pub fn distinct_brands(&self) -> AppResult<Vec<String>> {
        self.db.distinct_brands()
    }

    pub fn add_user(&self, display_name: &str, email: &str) -> AppResult<UserAccount> {
        self.db.insert_user(display_name, email)
    }

    pub fn users(&self) -> AppResult<Vec<UserAccount>> {
        self.db.list_users()
    }

    pub fn add_category(&self, name: &str) -> AppResult<Category> {
        self.db.insert_category(name)
    }

    pub fn categories(&self) -> AppResult<Vec<Category>> {
        CategoryDirectory::list_all(self.db.as_ref())
    }
}
