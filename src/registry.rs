//! Fixed schema of tracked asset fields.
//!
//! Field order is significant: validation errors, change notes and export
//! columns all follow it.

use crate::models::AssetStatus;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    FreeText,
    LongText,
    Status,
    Date,
    UserReference,
    CategoryReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

pub const ASSET_TAG: &str = "asset_tag";
pub const BRAND: &str = "brand";
pub const DATE_PURCHASED: &str = "date_purchased";
pub const ISSUED_TO: &str = "issued_to";
pub const STATUS: &str = "status";
pub const DESCRIPTION: &str = "description";

/// Input key of the out-of-band category association.
pub const CATEGORY_KEY: &str = "asset_category";

pub const FIELDS: [FieldSpec; 9] = [
    FieldSpec { name: ASSET_TAG, label: "Asset Tag", kind: FieldKind::FreeText },
    FieldSpec { name: "model", label: "Model", kind: FieldKind::FreeText },
    FieldSpec { name: "serial_number", label: "Serial Number", kind: FieldKind::FreeText },
    FieldSpec { name: BRAND, label: "Brand", kind: FieldKind::FreeText },
    FieldSpec { name: "supplier", label: "Supplier", kind: FieldKind::FreeText },
    FieldSpec { name: DATE_PURCHASED, label: "Date Purchased", kind: FieldKind::Date },
    FieldSpec { name: ISSUED_TO, label: "Issued To", kind: FieldKind::UserReference },
    FieldSpec { name: STATUS, label: "Status", kind: FieldKind::Status },
    FieldSpec { name: DESCRIPTION, label: "Description", kind: FieldKind::LongText },
];

pub const CATEGORY_FIELD: FieldSpec = FieldSpec {
    name: CATEGORY_KEY,
    label: "Category",
    kind: FieldKind::CategoryReference,
};

pub fn fields() -> Vec<&'static str> {
    FIELDS.iter().map(|field| field.name).collect()
}

/// Display labels for every field, the category pseudo-field included.
pub fn labels() -> BTreeMap<&'static str, &'static str> {
    FIELDS
        .iter()
        .chain(std::iter::once(&CATEGORY_FIELD))
        .map(|field| (field.name, field.label))
        .collect()
}

pub fn label_for(name: &str) -> Option<&'static str> {
    spec_for(name).map(|field| field.label)
}

pub fn spec_for(name: &str) -> Option<&'static FieldSpec> {
    FIELDS
        .iter()
        .chain(std::iter::once(&CATEGORY_FIELD))
        .find(|field| field.name == name)
}

pub fn status_options() -> Vec<&'static str> {
    AssetStatus::ALL.iter().map(|status| status.as_str()).collect()
}
