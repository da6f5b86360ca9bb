use crate::collaborators::{IdentityDirectory, RecordStore};
use crate::errors::AppResult;
use crate::models::{AssetId, HistoryEntry};

/// Append-only audit trail of one store. Writes happen only through the
/// save engine; reads come back newest first.
pub struct HistoryLog<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> HistoryLog<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    pub(crate) fn append(&self, id: AssetId, entry: &HistoryEntry) -> AppResult<()> {
        self.store.append_history(id, entry)
    }

    pub fn read(&self, id: AssetId) -> AppResult<Vec<HistoryEntry>> {
        let mut entries = self.store.read_history(id)?;
        entries.reverse();
        Ok(entries)
    }
}

/// Renders `<date> (<actor>): <note>`; the actor part is dropped when the
/// actor cannot be resolved.
pub fn render_line(entry: &HistoryEntry, identity: &dyn IdentityDirectory, date_format: &str) -> String {
    let when = entry.timestamp.format(date_format).to_string();
    let actor = if entry.actor > 0 {
        identity.resolve_display_name(entry.actor)
    } else {
        None
    };
    match actor {
        Some(name) => format!("{} ({}): {}", when, name, entry.note),
        None => format!("{}: {}", when, entry.note),
    }
}
