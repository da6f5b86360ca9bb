//! In-memory collaborators for unit tests.

use crate::collaborators::{CategoryDirectory, FixedClock, IdentityDirectory, RecordStore};
use crate::errors::AppResult;
use crate::models::{
    AssetId, AssetRecord, Category, CategoryId, FieldValues, HistoryEntry, RawInput, UserId,
};
use chrono::{DateTime, TimeZone, Utc};
use std::cell::RefCell;
use std::collections::BTreeMap;

pub(crate) fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
        .single()
        .expect("valid fixed time")
}

pub(crate) fn clock(actor: UserId) -> FixedClock {
    FixedClock {
        at: fixed_time(),
        actor,
    }
}

pub(crate) fn input(pairs: &[(&str, &str)]) -> RawInput {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

#[derive(Default)]
pub(crate) struct MemoryLedger {
    records: RefCell<BTreeMap<AssetId, FieldValues>>,
    history: RefCell<BTreeMap<AssetId, Vec<HistoryEntry>>>,
    links: RefCell<BTreeMap<AssetId, CategoryId>>,
    users: BTreeMap<UserId, String>,
    categories: Vec<Category>,
}

impl MemoryLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_user(mut self, id: UserId, name: &str) -> Self {
        self.users.insert(id, name.to_string());
        self
    }

    pub(crate) fn with_category(mut self, id: CategoryId, name: &str) -> Self {
        self.categories.push(Category {
            id,
            name: name.to_string(),
        });
        self
    }

    pub(crate) fn insert_record(&self, id: AssetId, values: &[(&str, &str)], category: Option<CategoryId>) {
        let values = values
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        self.records.borrow_mut().insert(id, values);
        if let Some(category) = category {
            self.links.borrow_mut().insert(id, category);
        }
    }

    pub(crate) fn history_len(&self, id: AssetId) -> usize {
        self.history.borrow().get(&id).map(Vec::len).unwrap_or_default()
    }
}

impl RecordStore for MemoryLedger {
    fn get(&self, id: AssetId) -> AppResult<FieldValues> {
        Ok(self.records.borrow().get(&id).cloned().unwrap_or_default())
    }

    fn put(&self, id: AssetId, field: &str, value: &str) -> AppResult<()> {
        self.records
            .borrow_mut()
            .entry(id)
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    fn list_all(&self) -> AppResult<Vec<AssetRecord>> {
        let links = self.links.borrow();
        Ok(self
            .records
            .borrow()
            .iter()
            .map(|(id, values)| AssetRecord {
                id: *id,
                title: format!("{:05}", id),
                values: values.clone(),
                category: links.get(id).copied(),
                created_at: fixed_time(),
                updated_at: fixed_time(),
            })
            .collect())
    }

    fn append_history(&self, id: AssetId, entry: &HistoryEntry) -> AppResult<()> {
        self.history.borrow_mut().entry(id).or_default().push(entry.clone());
        Ok(())
    }

    fn read_history(&self, id: AssetId) -> AppResult<Vec<HistoryEntry>> {
        Ok(self.history.borrow().get(&id).cloned().unwrap_or_default())
    }
}

impl IdentityDirectory for MemoryLedger {
    fn resolve_display_name(&self, user: UserId) -> Option<String> {
        self.users.get(&user).cloned()
    }
}

impl CategoryDirectory for MemoryLedger {
    fn list_all(&self) -> AppResult<Vec<Category>> {
        Ok(self.categories.clone())
    }

    fn resolve_name(&self, id: CategoryId) -> Option<String> {
        self.categories
            .iter()
            .find(|category| category.id == id)
            .map(|category| category.name.clone())
    }

    fn current_category_of(&self, asset: AssetId) -> AppResult<Option<CategoryId>> {
        Ok(self.links.borrow().get(&asset).copied())
    }

    fn set_category_of(&self, asset: AssetId, category: Option<CategoryId>) -> AppResult<()> {
        let mut links = self.links.borrow_mut();
        match category {
            Some(category) => {
                links.insert(asset, category);
            }
            None => {
                links.remove(&asset);
            }
        }
        Ok(())
    }
}
