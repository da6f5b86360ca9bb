use crate::models::{AssetStatus, RawInput};
use crate::registry::{FieldKind, CATEGORY_FIELD, FIELDS};
use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a strict `YYYY-MM-DD` date. The value must format back to exactly
/// the same string, which rejects overflowing days and unpadded parts.
pub fn parse_purchase_date(value: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(value, DATE_FORMAT).ok()?;
    (date.format(DATE_FORMAT).to_string() == value).then_some(date)
}

/// Checks submitted input against the field registry.
///
/// Messages come back in registry order with the category message last. An
/// empty result means the input may be saved.
pub fn validate(raw: &RawInput) -> Vec<String> {
    let mut errors = Vec::new();

    for field in FIELDS.iter() {
        let submitted = raw.get(field.name);
        let value = submitted.map(|value| value.trim()).unwrap_or_default();

        match field.kind {
            FieldKind::Date => {
                if value.is_empty() {
                    errors.push(required(field.label));
                } else if parse_purchase_date(value).is_none() {
                    errors.push(format!(
                        "The {} field has an invalid date format. Please use YYYY-MM-DD.",
                        field.label
                    ));
                }
            }
            FieldKind::Status => {
                if value.is_empty() {
                    errors.push(format!(
                        "The {} field is required; please select a status.",
                        field.label
                    ));
                } else if AssetStatus::parse(value).is_none() {
                    errors.push(format!("Invalid value selected for the {} field.", field.label));
                }
            }
            FieldKind::UserReference => {
                // Only an empty selection counts; the raw value is checked, not the trimmed one.
                if submitted.map_or(true, |raw_value| raw_value.is_empty()) {
                    errors.push(format!(
                        "The {} field is required; please select a user.",
                        field.label
                    ));
                }
            }
            FieldKind::FreeText | FieldKind::LongText | FieldKind::CategoryReference => {
                if value.is_empty() {
                    errors.push(required(field.label));
                }
            }
        }
    }

    let category = raw.get(CATEGORY_FIELD.name).map(|value| value.trim()).unwrap_or_default();
    if category.is_empty() || category == "0" {
        errors.push(format!(
            "The {} field is required; please select a category.",
            CATEGORY_FIELD.label
        ));
    }

    if !errors.is_empty() {
        tracing::debug!(count = errors.len(), "asset input rejected");
    }
    errors
}

fn required(label: &str) -> String {
    format!("The {} field is required.", label)
}
