use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type AssetId = i64;
pub type UserId = i64;
pub type CategoryId = i64;

/// Stored field values keyed by registry field name.
pub type FieldValues = BTreeMap<String, String>;

/// Submitted form values keyed by registry field name (plus the category key).
pub type RawInput = BTreeMap<String, String>;

/// Returns the stored value for `field`, or `""` when it was never written.
pub fn field_value<'a>(values: &'a FieldValues, field: &str) -> &'a str {
    values.get(field).map(String::as_str).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetStatus {
    Unassigned,
    Assigned,
    Returned,
    #[serde(rename = "For Repair")]
    ForRepair,
    Repairing,
    Archived,
    Disposed,
}

impl AssetStatus {
    pub const ALL: [AssetStatus; 7] = [
        Self::Unassigned,
        Self::Assigned,
        Self::Returned,
        Self::ForRepair,
        Self::Repairing,
        Self::Archived,
        Self::Disposed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unassigned => "Unassigned",
            Self::Assigned => "Assigned",
            Self::Returned => "Returned",
            Self::ForRepair => "For Repair",
            Self::Repairing => "Repairing",
            Self::Archived => "Archived",
            Self::Disposed => "Disposed",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub id: AssetId,
    pub title: String,
    pub values: FieldValues,
    pub category: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssetRecord {
    pub fn value(&self, field: &str) -> &str {
        field_value(&self.values, field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub actor: UserId,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListAssetsFilters {
    pub category_id: Option<CategoryId>,
    pub brand: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum SubmitOutcome {
    /// Nothing was written; the messages are meant to be shown verbatim.
    Rejected { errors: Vec<String> },
    /// An empty `changes` list is a no-op save.
    Saved { changes: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    Markdown,
    Json,
    Text,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw {
            "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "txt" => Ok(Self::Text),
            other => Err(AppError::InvalidInput(format!("Unsupported export format {}", other))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Json => "json",
            Self::Text => "txt",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub path: String,
    pub row_count: usize,
}

#[cfg(test)]
mod tests {
    use super::{AssetStatus, ExportFormat};

    #[test]
    fn status_parse_is_exact_and_case_sensitive() {
        assert_eq!(AssetStatus::parse("For Repair"), Some(AssetStatus::ForRepair));
        assert_eq!(AssetStatus::parse("for repair"), None);
        assert_eq!(AssetStatus::parse(" Assigned"), None);
        assert_eq!(AssetStatus::parse(""), None);
    }

    #[test]
    fn status_serializes_with_display_label() {
        let raw = serde_json::to_string(&AssetStatus::ForRepair).expect("serialize");
        assert_eq!(raw, "\"For Repair\"");
    }

    #[test]
    fn rejects_unknown_export_format() {
        assert!(ExportFormat::parse("pdf").is_err());
        assert_eq!(ExportFormat::parse("md").expect("md").extension(), "md");
    }
}
