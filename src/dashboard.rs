use crate::collaborators::IdentityDirectory;
use crate::diff::coerce_user_id;
use crate::models::{AssetRecord, AssetStatus, Category};
use crate::registry::{ISSUED_TO, STATUS};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_STATUS: &str = "Unknown";
pub const UNASSIGNED_USER: &str = "Unassigned";
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountBucket {
    pub label: String,
    pub count: u64,
}

/// Label counts kept in first-seen order, so chart series stay stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tally {
    buckets: Vec<CountBucket>,
}

impl Tally {
    fn seed(&mut self, label: &str) {
        if self.get(label).is_none() {
            self.buckets.push(CountBucket {
                label: label.to_string(),
                count: 0,
            });
        }
    }

    fn increment(&mut self, label: &str) {
        match self.buckets.iter_mut().find(|bucket| bucket.label == label) {
            Some(bucket) => bucket.count += 1,
            None => self.buckets.push(CountBucket {
                label: label.to_string(),
                count: 1,
            }),
        }
    }

    fn drop_empty(&mut self) {
        self.buckets.retain(|bucket| bucket.count > 0);
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.buckets
            .iter()
            .find(|bucket| bucket.label == label)
            .map(|bucket| bucket.count)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|bucket| bucket.count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountBucket> {
        self.buckets.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAggregate {
    pub status_counts: Tally,
    pub user_counts: Tally,
    pub category_counts: Tally,
}

/// Counts every record once per dimension.
///
/// Status buckets are always complete, zero counts included. User and
/// category buckets only list labels that occur.
pub fn aggregate(
    records: &[AssetRecord],
    known_categories: &[Category],
    identity: &dyn IdentityDirectory,
) -> DashboardAggregate {
    let mut status_counts = Tally::default();
    for status in AssetStatus::ALL {
        status_counts.seed(status.as_str());
    }
    status_counts.seed(UNKNOWN_STATUS);

    let mut category_counts = Tally::default();
    for category in known_categories {
        category_counts.seed(&category.name);
    }
    category_counts.seed(UNCATEGORIZED);

    let mut user_counts = Tally::default();
    user_counts.seed(UNASSIGNED_USER);

    for record in records {
        let status = record.value(STATUS);
        let status_label = if status.is_empty() {
            AssetStatus::Unassigned.as_str()
        } else {
            AssetStatus::parse(status).map_or(UNKNOWN_STATUS, AssetStatus::as_str)
        };
        status_counts.increment(status_label);

        let user_label = match coerce_user_id(record.value(ISSUED_TO)) {
            0 => UNASSIGNED_USER.to_string(),
            id => identity
                .resolve_display_name(id)
                .unwrap_or_else(|| format!("Unknown User (ID: {})", id)),
        };
        user_counts.increment(&user_label);

        let category_label = record
            .category
            .and_then(|id| known_categories.iter().find(|category| category.id == id))
            .map_or(UNCATEGORIZED, |category| category.name.as_str());
        category_counts.increment(category_label);
    }

    user_counts.drop_empty();
    category_counts.drop_empty();

    DashboardAggregate {
        status_counts,
        user_counts,
        category_counts,
    }
}
