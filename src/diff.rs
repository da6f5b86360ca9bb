//! Sanitize, compare and describe submitted values, then persist whatever
//! actually changed and record one history entry for the save.

use crate::collaborators::{ActorClock, CategoryDirectory, IdentityDirectory, RecordStore};
use crate::errors::AppResult;
use crate::history::HistoryLog;
use crate::models::{field_value, AssetId, AssetStatus, CategoryId, FieldValues, HistoryEntry, RawInput, UserId};
use crate::registry::{FieldKind, FieldSpec, CATEGORY_FIELD, FIELDS};
use crate::validation::parse_purchase_date;

/// Coerces a submitted or stored user reference. Anything that is not a
/// non-negative integer becomes 0 (unassigned).
pub fn coerce_user_id(raw: &str) -> UserId {
    raw.trim().parse::<UserId>().ok().filter(|id| *id >= 0).unwrap_or(0)
}

/// Parses a category selection; empty, zero and non-numeric values clear it.
pub fn coerce_category_id(raw: &str) -> Option<CategoryId> {
    raw.trim().parse::<CategoryId>().ok().filter(|id| *id > 0)
}

pub fn sanitize(kind: FieldKind, raw: &str) -> String {
    match kind {
        FieldKind::LongText => raw
            .trim_matches(|ch: char| ch.is_whitespace() || ch.is_control())
            .to_string(),
        FieldKind::Date => {
            let value = raw.trim();
            match parse_purchase_date(value) {
                Some(_) => value.to_string(),
                None => String::new(),
            }
        }
        FieldKind::UserReference => match coerce_user_id(raw) {
            0 => String::new(),
            id => id.to_string(),
        },
        FieldKind::Status => AssetStatus::parse(raw.trim())
            .unwrap_or(AssetStatus::ALL[0])
            .as_str()
            .to_string(),
        FieldKind::FreeText | FieldKind::CategoryReference => raw.trim().to_string(),
    }
}

pub fn equals(kind: FieldKind, old: &str, new: &str) -> bool {
    match kind {
        FieldKind::UserReference => coerce_user_id(old) == coerce_user_id(new),
        _ => old.trim() == new.trim(),
    }
}

pub fn describe(field: &FieldSpec, old: &str, new: &str, identity: &dyn IdentityDirectory) -> String {
    match field.kind {
        FieldKind::LongText => format!("{} changed.", field.label),
        FieldKind::UserReference => format!(
            "{} changed from \"{}\" to \"{}\"",
            field.label,
            user_display(coerce_user_id(old), identity),
            user_display(coerce_user_id(new), identity)
        ),
        _ => format!(
            "{} changed from \"{}\" to \"{}\"",
            field.label,
            value_display(old),
            value_display(new)
        ),
    }
}

pub fn describe_category(old_name: Option<&str>, new_name: Option<&str>) -> String {
    format!(
        "{} changed from \"{}\" to \"{}\"",
        CATEGORY_FIELD.label,
        old_name.unwrap_or("None"),
        new_name.unwrap_or("None")
    )
}

pub fn user_display(id: UserId, identity: &dyn IdentityDirectory) -> String {
    if id == 0 {
        return "Unassigned".to_string();
    }
    identity
        .resolve_display_name(id)
        .unwrap_or_else(|| format!("Unknown User (ID: {})", id))
}

fn value_display(value: &str) -> &str {
    if value.is_empty() {
        "empty"
    } else {
        value
    }
}

/// Request-scoped save path over the injected collaborators.
///
/// Callers validate first; this engine trusts its input and never rejects.
pub struct SaveEngine<'a> {
    store: &'a dyn RecordStore,
    identity: &'a dyn IdentityDirectory,
    categories: &'a dyn CategoryDirectory,
    clock: &'a dyn ActorClock,
}

impl<'a> SaveEngine<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        identity: &'a dyn IdentityDirectory,
        categories: &'a dyn CategoryDirectory,
        clock: &'a dyn ActorClock,
    ) -> Self {
        Self {
            store,
            identity,
            categories,
            clock,
        }
    }

    /// Persists every changed field and the category link, returning the
    /// change descriptions. A save without changes writes nothing.
    pub fn save(
        &self,
        id: AssetId,
        raw: &RawInput,
        current: &FieldValues,
        current_category: Option<CategoryId>,
    ) -> AppResult<Vec<String>> {
        let mut changes = Vec::new();

        for field in FIELDS.iter() {
            let submitted = raw.get(field.name).map(String::as_str).unwrap_or_default();
            let new_value = sanitize(field.kind, submitted);
            let old_value = field_value(current, field.name);
            if equals(field.kind, old_value, &new_value) {
                continue;
            }

            self.store.put(id, field.name, &new_value)?;
            changes.push(describe(field, old_value, &new_value, self.identity));
        }

        if let Some(submitted) = raw.get(CATEGORY_FIELD.name) {
            let new_category = coerce_category_id(submitted);
            if new_category != current_category {
                self.categories.set_category_of(id, new_category)?;
                let old_name = current_category.and_then(|category| self.categories.resolve_name(category));
                let new_name = new_category.and_then(|category| self.categories.resolve_name(category));
                changes.push(describe_category(old_name.as_deref(), new_name.as_deref()));
            }
        }

        if changes.is_empty() {
            tracing::debug!(asset_id = id, "save without effective changes");
            return Ok(changes);
        }

        let entry = HistoryEntry {
            timestamp: self.clock.now(),
            actor: self.clock.actor(),
            note: changes.join("; "),
        };
        HistoryLog::new(self.store).append(id, &entry)?;
        tracing::info!(asset_id = id, actor = entry.actor, changes = changes.len(), "asset history appended");

        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::RecordStore;
    use crate::registry::spec_for;
    use crate::testing::{clock, input, MemoryLedger};

    const STORED: [(&str, &str); 9] = [
        ("asset_tag", "IT-0042"),
        ("model", "Latitude 7440"),
        ("serial_number", "SN-998877"),
        ("brand", "Dell"),
        ("supplier", "Acme Supplies"),
        ("date_purchased", "2024-03-15"),
        ("issued_to", "7"),
        ("status", "Assigned"),
        ("description", "Primary laptop."),
    ];

    fn submission(overrides: &[(&str, &str)]) -> RawInput {
        let mut raw = input(&STORED);
        for (key, value) in overrides {
            raw.insert(key.to_string(), value.to_string());
        }
        raw
    }

    fn ledger() -> MemoryLedger {
        MemoryLedger::new()
            .with_user(7, "Dana Reyes")
            .with_user(9, "Lee Park")
            .with_category(3, "Laptops")
            .with_category(5, "Monitors")
    }

    fn save(ledger: &MemoryLedger, id: AssetId, raw: &RawInput) -> Vec<String> {
        let clock = clock(1);
        let engine = SaveEngine::new(ledger, ledger, ledger, &clock);
        let current = ledger.get(id).expect("current values");
        let category = ledger.current_category_of(id).expect("current category");
        engine.save(id, raw, &current, category).expect("save")
    }

    #[test]
    fn sanitizes_by_kind() {
        assert_eq!(sanitize(FieldKind::FreeText, "  Dell \t"), "Dell");
        assert_eq!(sanitize(FieldKind::LongText, "\n  line one\n  line two \u{7}\n"), "line one\n  line two");
        assert_eq!(sanitize(FieldKind::Date, "2024-02-30"), "");
        assert_eq!(sanitize(FieldKind::Date, " 2024-02-29 "), "2024-02-29");
        assert_eq!(sanitize(FieldKind::UserReference, "12"), "12");
        assert_eq!(sanitize(FieldKind::UserReference, "-4"), "");
        assert_eq!(sanitize(FieldKind::UserReference, "abc"), "");
        assert_eq!(sanitize(FieldKind::Status, "Lost"), "Unassigned");
        assert_eq!(sanitize(FieldKind::Status, "For Repair"), "For Repair");
    }

    #[test]
    fn user_references_compare_as_integers() {
        assert!(equals(FieldKind::UserReference, "0", ""));
        assert!(equals(FieldKind::UserReference, "007", "7"));
        assert!(!equals(FieldKind::UserReference, "7", "9"));
        assert!(equals(FieldKind::FreeText, " Dell", "Dell "));
    }

    #[test]
    fn describes_values_per_kind() {
        let ledger = ledger();
        let description = spec_for("description").expect("description field");
        assert_eq!(describe(description, "a", "b", &ledger), "Description changed.");

        let issued_to = spec_for("issued_to").expect("issued_to field");
        assert_eq!(
            describe(issued_to, "", "7", &ledger),
            "Issued To changed from \"Unassigned\" to \"Dana Reyes\""
        );
        assert_eq!(
            describe(issued_to, "7", "41", &ledger),
            "Issued To changed from \"Dana Reyes\" to \"Unknown User (ID: 41)\""
        );

        let brand = spec_for("brand").expect("brand field");
        assert_eq!(describe(brand, "", "HP", &ledger), "Brand changed from \"empty\" to \"HP\"");
    }

    #[test]
    fn status_change_produces_single_note_and_entry() {
        let ledger = ledger();
        ledger.insert_record(1, &STORED, Some(3));

        let changes = save(&ledger, 1, &submission(&[("status", "Repairing"), ("asset_category", "3")]));
        assert_eq!(changes, vec!["Status changed from \"Assigned\" to \"Repairing\""]);
        assert_eq!(ledger.history_len(1), 1);
        assert_eq!(ledger.get(1).expect("values").get("status").map(String::as_str), Some("Repairing"));
    }

    #[test]
    fn saving_the_same_input_twice_is_a_no_op() {
        let ledger = ledger();
        let raw = submission(&[("asset_category", "5")]);

        let first = save(&ledger, 2, &raw);
        assert_eq!(first.len(), STORED.len() + 1);
        assert_eq!(ledger.history_len(2), 1);

        let second = save(&ledger, 2, &raw);
        assert!(second.is_empty());
        assert_eq!(ledger.history_len(2), 1);
    }

    #[test]
    fn category_assignment_is_described_by_name() {
        let ledger = ledger();
        ledger.insert_record(3, &STORED, None);

        let changes = save(&ledger, 3, &submission(&[("asset_category", "3")]));
        assert_eq!(changes, vec!["Category changed from \"None\" to \"Laptops\""]);
        assert_eq!(ledger.current_category_of(3).expect("category"), Some(3));

        let changes = save(&ledger, 3, &submission(&[("asset_category", "")]));
        assert_eq!(changes, vec!["Category changed from \"Laptops\" to \"None\""]);
        assert_eq!(ledger.current_category_of(3).expect("category"), None);
    }

    #[test]
    fn absent_category_key_leaves_link_untouched() {
        let ledger = ledger();
        ledger.insert_record(4, &STORED, Some(5));

        let changes = save(&ledger, 4, &submission(&[]));
        assert!(changes.is_empty());
        assert_eq!(ledger.current_category_of(4).expect("category"), Some(5));
    }

    #[test]
    fn history_note_joins_changes_in_registry_order() {
        let ledger = ledger();
        ledger.insert_record(5, &STORED, Some(3));

        let changes = save(
            &ledger,
            5,
            &submission(&[
                ("description", "Replaced battery."),
                ("brand", "Lenovo"),
                ("issued_to", "9"),
                ("asset_category", "5"),
            ]),
        );
        assert_eq!(
            changes,
            vec![
                "Brand changed from \"Dell\" to \"Lenovo\"",
                "Issued To changed from \"Dana Reyes\" to \"Lee Park\"",
                "Description changed.",
                "Category changed from \"Laptops\" to \"Monitors\"",
            ]
        );

        let history = ledger.read_history(5).expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].note, changes.join("; "));
        assert_eq!(history[0].actor, 1);
    }

    #[test]
    fn accepted_dates_survive_sanitization() {
        let ledger = ledger();
        ledger.insert_record(6, &STORED, Some(3));

        save(&ledger, 6, &submission(&[("date_purchased", "2024-02-29"), ("asset_category", "3")]));
        let values = ledger.get(6).expect("values");
        assert_eq!(values.get("date_purchased").map(String::as_str), Some("2024-02-29"));
    }
}
