use crate::errors::AppResult;
use crate::models::{AssetId, AssetRecord, Category, CategoryId, FieldValues, HistoryEntry, UserId};
use chrono::{DateTime, Utc};

/// Persistent home of asset field values and their history.
pub trait RecordStore {
    fn get(&self, id: AssetId) -> AppResult<FieldValues>;
    fn put(&self, id: AssetId, field: &str, value: &str) -> AppResult<()>;
    fn list_all(&self) -> AppResult<Vec<AssetRecord>>;
    fn append_history(&self, id: AssetId, entry: &HistoryEntry) -> AppResult<()>;
    /// Entries in insertion order.
    fn read_history(&self, id: AssetId) -> AppResult<Vec<HistoryEntry>>;
}

pub trait IdentityDirectory {
    /// `None` when the user does not exist or cannot be looked up.
    fn resolve_display_name(&self, user: UserId) -> Option<String>;
}

pub trait CategoryDirectory {
    fn list_all(&self) -> AppResult<Vec<Category>>;
    fn resolve_name(&self, id: CategoryId) -> Option<String>;
    fn current_category_of(&self, asset: AssetId) -> AppResult<Option<CategoryId>>;
    /// Replaces the single category link; `None` clears it.
    fn set_category_of(&self, asset: AssetId, category: Option<CategoryId>) -> AppResult<()>;
}

/// Who is acting and when, for history entries.
pub trait ActorClock {
    fn now(&self) -> DateTime<Utc>;
    fn actor(&self) -> UserId;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    actor: UserId,
}

impl SystemClock {
    pub fn new(actor: UserId) -> Self {
        Self { actor }
    }
}

impl ActorClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn actor(&self) -> UserId {
        self.actor
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub at: DateTime<Utc>,
    pub actor: UserId,
}

impl ActorClock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at
    }

    fn actor(&self) -> UserId {
        self.actor
    }
}
