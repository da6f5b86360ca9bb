use crate::collaborators::{CategoryDirectory, IdentityDirectory, RecordStore};
use crate::errors::{AppError, AppResult};
use crate::models::{
    AssetId, AssetRecord, Category, CategoryId, FieldValues, HistoryEntry, ListAssetsFilters, UserAccount, UserId,
};
use crate::registry::{BRAND, STATUS};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!("schema.sql");

const ASSET_COLUMNS: &str = "SELECT a.id, a.title, a.created_at, a.updated_at, ac.category_id
     FROM assets a LEFT JOIN asset_categories ac ON ac.asset_id = a.id";

/// SQLite-backed record store, identity directory and category directory.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database mutex poisoned".to_string()))
    }

    fn lookup_name(&self, sql: &str, id: i64) -> AppResult<Option<String>> {
        let conn = self.lock()?;
        let name = conn
            .query_row(sql, [id], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(name)
    }

    pub fn create_asset(&self, title: &str) -> AppResult<AssetRecord> {
        let now = Utc::now();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO assets (title, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![title, now.to_rfc3339()],
        )?;

        Ok(AssetRecord {
            id: conn.last_insert_rowid(),
            title: title.to_string(),
            values: FieldValues::new(),
            category: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_asset(&self, id: AssetId) -> AppResult<Option<AssetRecord>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(&format!("{} WHERE a.id = ?1", ASSET_COLUMNS), [id], parse_asset_row)
            .optional()?;
        match row {
            Some(mut record) => {
                record.values = load_values(&conn, record.id)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    pub fn set_title(&self, id: AssetId, title: &str) -> AppResult<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE assets SET title = ?1, updated_at = ?2 WHERE id = ?3",
            params![title, Utc::now().to_rfc3339(), id],
        )?;
        if updated == 0 {
            return Err(AppError::NotFound(format!("Asset {} not found", id)));
        }
        Ok(())
    }

    pub fn list_titles(&self) -> AppResult<Vec<String>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare("SELECT title FROM assets ORDER BY title ASC")?;
        let titles = statement
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(titles)
    }

    pub fn list_assets(&self, filters: &ListAssetsFilters) -> AppResult<Vec<AssetRecord>> {
        let conn = self.lock()?;
        let mut query = format!("{} WHERE 1 = 1", ASSET_COLUMNS);
        let mut params_vec: Vec<Value> = Vec::new();

        if let Some(category_id) = filters.category_id {
            query.push_str(" AND ac.category_id = ?");
            params_vec.push(Value::Integer(category_id));
        }
        if let Some(brand) = &filters.brand {
            query.push_str(
                " AND EXISTS (SELECT 1 FROM asset_fields f WHERE f.asset_id = a.id AND f.field = ? AND f.value = ?)",
            );
            params_vec.push(Value::Text(BRAND.to_string()));
            params_vec.push(Value::Text(brand.clone()));
        }
        if let Some(status) = &filters.status {
            query.push_str(
                " AND EXISTS (SELECT 1 FROM asset_fields f WHERE f.asset_id = a.id AND f.field = ? AND f.value = ?)",
            );
            params_vec.push(Value::Text(STATUS.to_string()));
            params_vec.push(Value::Text(status.clone()));
        }

        query.push_str(" ORDER BY a.title ASC, a.id ASC LIMIT ? OFFSET ?");
        params_vec.push(Value::Integer(filters.limit.map(i64::from).unwrap_or(-1)));
        params_vec.push(Value::Integer(i64::from(filters.offset.unwrap_or(0))));

        let mut statement = conn.prepare(&query)?;
        let rows = statement
            .query_map(rusqlite::params_from_iter(params_vec.iter()), parse_asset_row)?
            .collect::<Result<Vec<_>, _>>()?;
        with_values(&conn, rows)
    }

    pub fn distinct_brands(&self) -> AppResult<Vec<String>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare(
            "SELECT DISTINCT value FROM asset_fields WHERE field = ?1 AND value <> '' ORDER BY value ASC",
        )?;
        let brands = statement
            .query_map([BRAND], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(brands)
    }

    pub fn insert_user(&self, display_name: &str, email: &str) -> AppResult<UserAccount> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (display_name, email) VALUES (?1, ?2)",
            params![display_name, email],
        )?;
        Ok(UserAccount {
            id: conn.last_insert_rowid(),
            display_name: display_name.to_string(),
            email: email.to_string(),
        })
    }

    pub fn list_users(&self) -> AppResult<Vec<UserAccount>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare("SELECT id, display_name, email FROM users ORDER BY display_name ASC")?;
        let users = statement
            .query_map([], |row| {
                Ok(UserAccount {
                    id: row.get(0)?,
                    display_name: row.get(1)?,
                    email: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn insert_category(&self, name: &str) -> AppResult<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Category name cannot be empty".to_string()));
        }
        let conn = self.lock()?;
        conn.execute("INSERT INTO categories (name) VALUES (?1)", [name])?;
        Ok(Category {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }
}

impl RecordStore for Database {
    fn get(&self, id: AssetId) -> AppResult<FieldValues> {
        let conn = self.lock()?;
        let exists: i64 = conn.query_row("SELECT COUNT(1) FROM assets WHERE id = ?1", [id], |row| row.get(0))?;
        if exists == 0 {
            return Err(AppError::NotFound(format!("Asset {} not found", id)));
        }
        load_values(&conn, id)
    }

    fn put(&self, id: AssetId, field: &str, value: &str) -> AppResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO asset_fields (asset_id, field, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(asset_id, field) DO UPDATE SET value = excluded.value",
            params![id, field, value],
        )?;
        conn.execute(
            "UPDATE assets SET updated_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    fn list_all(&self) -> AppResult<Vec<AssetRecord>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare(&format!("{} ORDER BY a.id ASC", ASSET_COLUMNS))?;
        let rows = statement
            .query_map([], parse_asset_row)?
            .collect::<Result<Vec<_>, _>>()?;
        with_values(&conn, rows)
    }

    fn append_history(&self, id: AssetId, entry: &HistoryEntry) -> AppResult<()> {
        let conn = self.lock()?;
        let seq: i64 = conn.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM asset_history WHERE asset_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        conn.execute(
            "INSERT INTO asset_history (id, asset_id, seq, actor_id, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                Uuid::new_v4().to_string(),
                id,
                seq,
                entry.actor,
                entry.note,
                entry.timestamp.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn read_history(&self, id: AssetId) -> AppResult<Vec<HistoryEntry>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare(
            "SELECT actor_id, note, created_at FROM asset_history WHERE asset_id = ?1 ORDER BY seq ASC",
        )?;
        let entries = statement
            .query_map([id], |row| {
                Ok(HistoryEntry {
                    actor: row.get(0)?,
                    note: row.get(1)?,
                    timestamp: parse_time(&row.get::<_, String>(2)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

impl IdentityDirectory for Database {
    fn resolve_display_name(&self, user: UserId) -> Option<String> {
        match self.lookup_name("SELECT display_name FROM users WHERE id = ?1", user) {
            Ok(name) => name,
            Err(error) => {
                tracing::warn!(user_id = user, error = %error, "user lookup failed");
                None
            }
        }
    }
}

impl CategoryDirectory for Database {
    fn list_all(&self) -> AppResult<Vec<Category>> {
        let conn = self.lock()?;
        let mut statement = conn.prepare("SELECT id, name FROM categories ORDER BY name ASC")?;
        let categories = statement
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    fn resolve_name(&self, id: CategoryId) -> Option<String> {
        match self.lookup_name("SELECT name FROM categories WHERE id = ?1", id) {
            Ok(name) => name,
            Err(error) => {
                tracing::warn!(category_id = id, error = %error, "category lookup failed");
                None
            }
        }
    }

    fn current_category_of(&self, asset: AssetId) -> AppResult<Option<CategoryId>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT category_id FROM asset_categories WHERE asset_id = ?1",
            [asset],
            |row| row.get(0),
        )
        .optional()
        .map_err(AppError::from)
    }

    fn set_category_of(&self, asset: AssetId, category: Option<CategoryId>) -> AppResult<()> {
        let conn = self.lock()?;
        match category {
            Some(category) => {
                conn.execute(
                    "INSERT INTO asset_categories (asset_id, category_id) VALUES (?1, ?2)
                     ON CONFLICT(asset_id) DO UPDATE SET category_id = excluded.category_id",
                    params![asset, category],
                )?;
            }
            None => {
                conn.execute("DELETE FROM asset_categories WHERE asset_id = ?1", [asset])?;
            }
        }
        Ok(())
    }
}

fn load_values(conn: &Connection, id: AssetId) -> AppResult<FieldValues> {
    let mut statement = conn.prepare("SELECT field, value FROM asset_fields WHERE asset_id = ?1")?;
    let values = statement
        .query_map([id], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<FieldValues, _>>()?;
    Ok(values)
}

fn with_values(conn: &Connection, rows: Vec<AssetRecord>) -> AppResult<Vec<AssetRecord>> {
    rows.into_iter()
        .map(|mut record| {
            record.values = load_values(conn, record.id)?;
            Ok(record)
        })
        .collect()
}

fn parse_asset_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AssetRecord> {
    Ok(AssetRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        values: FieldValues::new(),
        created_at: parse_time(&row.get::<_, String>(2)?)?,
        updated_at: parse_time(&row.get::<_, String>(3)?)?,
        category: row.get(4)?,
    })
}

fn parse_time(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, error.to_string())),
            )
        })
}
