//! SQLite-backed item storage

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::str::FromStr;

use crate::items::{ClassifiedItem, Status, StoredItem};
use crate::query::QueryFilters;

/// Content is truncated to this many characters before persisting
const MAX_CONTENT_LEN: usize = 2000;

/// At most this many tags are persisted per item
const MAX_TAGS: usize = 10;

/// Categories seeded on first open
const DEFAULT_CATEGORIES: &[&str] = &["personal", "interns", "identity labs"];

/// Column list shared by every SELECT that hydrates a `StoredItem`
const ITEM_COLUMNS: &str =
    "id, owner, kind, content, priority, category, deadline, context, tags, status, created_at, updated_at";

/// Same columns qualified for joins against `items_fts`, which carries its
/// own `content` and `tags` columns
const ITEM_COLUMNS_QUALIFIED: &str =
    "items.id, items.owner, items.kind, items.content, items.priority, items.category, \
     items.deadline, items.context, items.tags, items.status, items.created_at, items.updated_at";

/// Owner-scoped item store over SQLite
pub struct ItemStore {
    db: Connection,
}

impl ItemStore {
    /// Open or create the store at `{dir}/items.db`
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let base = dir.as_ref();
        std::fs::create_dir_all(base)?;

        let db_path = base.join("items.db");
        let db = Connection::open(&db_path)
            .with_context(|| format!("Failed to open item database at {}", db_path.display()))?;

        // WAL keeps concurrent pipeline runs from blocking each other
        db.query_row("PRAGMA journal_mode = WAL", [], |_row| Ok(()))?;

        Self::init_schema(&db)?;
        Ok(Self { db })
    }

    /// In-memory store for tests
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::init_schema(&db)?;
        Ok(Self { db })
    }

    fn init_schema(db: &Connection) -> Result<()> {
        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL,
                kind TEXT NOT NULL CHECK(kind IN ('task', 'idea')),
                content TEXT NOT NULL,
                priority TEXT CHECK(priority IN ('high', 'medium', 'low')),
                category TEXT,
                deadline TEXT,
                context TEXT,
                tags TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK(status IN ('pending', 'completed', 'cancelled')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_items_owner ON items(owner);
            CREATE INDEX IF NOT EXISTS idx_items_kind ON items(kind);
            CREATE INDEX IF NOT EXISTS idx_items_priority ON items(priority);
            CREATE INDEX IF NOT EXISTS idx_items_category ON items(category);
            CREATE INDEX IF NOT EXISTS idx_items_status ON items(status);
            CREATE INDEX IF NOT EXISTS idx_items_deadline ON items(deadline);

            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE VIRTUAL TABLE IF NOT EXISTS items_fts USING fts5(
                content,
                tags,
                content='items',
                content_rowid='id'
            );

            CREATE TRIGGER IF NOT EXISTS items_ai AFTER INSERT ON items BEGIN
                INSERT INTO items_fts(rowid, content, tags)
                VALUES (new.id, new.content, new.tags);
            END;

            CREATE TRIGGER IF NOT EXISTS items_ad AFTER DELETE ON items BEGIN
                INSERT INTO items_fts(items_fts, rowid, content, tags)
                VALUES ('delete', old.id, old.content, old.tags);
            END;

            CREATE TRIGGER IF NOT EXISTS items_au AFTER UPDATE ON items BEGIN
                INSERT INTO items_fts(items_fts, rowid, content, tags)
                VALUES ('delete', old.id, old.content, old.tags);
                INSERT INTO items_fts(rowid, content, tags)
                VALUES (new.id, new.content, new.tags);
            END;",
        )
        .context("Failed to initialize item schema")?;

        let mut seed = db.prepare("INSERT OR IGNORE INTO categories (name) VALUES (?1)")?;
        for category in DEFAULT_CATEGORIES {
            seed.execute(params![category])?;
        }

        Ok(())
    }

    /// Persist a classified item for `owner`, returning its id.
    ///
    /// Validates before any SQL: content must be non-empty after trimming
    /// and is capped, tags are lowercased and capped. A new category name
    /// is created on first use.
    pub fn save(
        &self,
        owner: &str,
        item: &ClassifiedItem,
        context: Option<&str>,
    ) -> Result<i64> {
        if owner.trim().is_empty() {
            bail!("owner is required");
        }

        let content: String = item.content.trim().chars().take(MAX_CONTENT_LEN).collect();
        if content.is_empty() {
            bail!("content cannot be empty");
        }

        let tags = normalize_tags(&item.tags);

        if let Some(category) = item.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            self.db.execute(
                "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
                params![category],
            )?;
        }

        let now = Utc::now().to_rfc3339();
        self.db.execute(
            "INSERT INTO items (owner, kind, content, priority, category, deadline, context, tags,
                                status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                owner,
                item.kind.as_str(),
                content,
                item.priority.map(|p| p.as_str()),
                item.category.as_deref().map(str::trim).filter(|c| !c.is_empty()),
                item.deadline.map(|d| d.to_string()),
                context,
                tags.join(","),
                Status::Pending.as_str(),
                now,
                now,
            ],
        )?;

        Ok(self.db.last_insert_rowid())
    }

    /// Structured filter query, newest first
    pub fn query(&self, owner: &str, filters: &QueryFilters, limit: usize) -> Result<Vec<StoredItem>> {
        let mut sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE owner = ?");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner.to_string())];

        if let Some(kind) = filters.kind {
            sql.push_str(" AND kind = ?");
            params_vec.push(Box::new(kind.as_str()));
        }
        if let Some(priority) = filters.priority {
            sql.push_str(" AND priority = ?");
            params_vec.push(Box::new(priority.as_str()));
        }
        if let Some(status) = filters.status {
            sql.push_str(" AND status = ?");
            params_vec.push(Box::new(status.as_str()));
        }
        if let Some(category) = &filters.category {
            sql.push_str(" AND category = ?");
            params_vec.push(Box::new(category.clone()));
        }
        if let Some(from) = filters.deadline_from {
            sql.push_str(" AND deadline >= ?");
            params_vec.push(Box::new(from.to_string()));
        }
        if let Some(to) = filters.deadline_to {
            sql.push_str(" AND deadline <= ?");
            params_vec.push(Box::new(to.to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC LIMIT ?");
        params_vec.push(Box::new(limit as i64));

        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt
            .query_map(
                rusqlite::params_from_iter(params_vec.iter().map(|p| p.as_ref())),
                item_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Case-insensitive exact tag membership search, OR semantics
    pub fn search_by_tags(&self, owner: &str, keywords: &[String], limit: usize) -> Result<Vec<StoredItem>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let conditions = vec!["(',' || tags || ',') LIKE ?"; keywords.len()].join(" OR ");
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE owner = ? AND ({conditions})
             ORDER BY created_at DESC LIMIT ?"
        );

        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner.to_string())];
        for keyword in keywords {
            params_vec.push(Box::new(format!("%,{},%", keyword.to_lowercase())));
        }
        params_vec.push(Box::new(limit as i64));

        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt
            .query_map(
                rusqlite::params_from_iter(params_vec.iter().map(|p| p.as_ref())),
                item_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Full-text search over content+tags via FTS5, ranked by relevance.
    ///
    /// `match_expr` uses FTS5 MATCH syntax (keywords joined with OR). A
    /// malformed expression falls back to a LIKE scan instead of erroring.
    pub fn search_full_text(&self, owner: &str, match_expr: &str, limit: usize) -> Result<Vec<StoredItem>> {
        if match_expr.trim().is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {ITEM_COLUMNS_QUALIFIED} FROM items
             JOIN items_fts ON items.id = items_fts.rowid
             WHERE items_fts MATCH ?1 AND items.owner = ?2
             ORDER BY rank LIMIT ?3"
        );

        let result = (|| -> rusqlite::Result<Vec<StoredItem>> {
            let mut stmt = self.db.prepare(&sql)?;
            let rows = stmt
                .query_map(params![match_expr, owner, limit as i64], item_from_row)?
                .collect();
            rows
        })();

        match result {
            Ok(items) => Ok(items),
            // Bad MATCH syntax (stray punctuation in keywords) - scan instead
            Err(_) => self.search_like(owner, match_expr, limit),
        }
    }

    fn search_like(&self, owner: &str, match_expr: &str, limit: usize) -> Result<Vec<StoredItem>> {
        let terms: Vec<&str> = match_expr
            .split_whitespace()
            .filter(|t| !t.eq_ignore_ascii_case("or"))
            .collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let conditions = vec!["(content LIKE ? OR tags LIKE ?)"; terms.len()].join(" OR ");
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE owner = ? AND ({conditions})
             ORDER BY created_at DESC LIMIT ?"
        );

        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner.to_string())];
        for term in &terms {
            let pattern = format!("%{term}%");
            params_vec.push(Box::new(pattern.clone()));
            params_vec.push(Box::new(pattern));
        }
        params_vec.push(Box::new(limit as i64));

        let mut stmt = self.db.prepare(&sql)?;
        let rows = stmt
            .query_map(
                rusqlite::params_from_iter(params_vec.iter().map(|p| p.as_ref())),
                item_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Load one item by id, scoped to `owner`
    pub fn get(&self, owner: &str, id: i64) -> Result<Option<StoredItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1 AND owner = ?2");
        let result = self.db.query_row(&sql, params![id, owner], item_from_row);

        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Update an item's status. Returns false when no owned item matched.
    pub fn update_status(&self, owner: &str, id: i64, status: Status) -> Result<bool> {
        let changed = self.db.execute(
            "UPDATE items SET status = ?1, updated_at = ?2 WHERE id = ?3 AND owner = ?4",
            params![status.as_str(), Utc::now().to_rfc3339(), id, owner],
        )?;

        Ok(changed > 0)
    }

    /// Aggregate counts for an owner's items
    pub fn stats(&self, owner: &str) -> Result<StoreStats> {
        let count = |sql: &str| -> Result<i64> {
            Ok(self.db.query_row(sql, params![owner], |row| row.get(0))?)
        };

        let total = count("SELECT COUNT(*) FROM items WHERE owner = ?1")?;
        let tasks = count("SELECT COUNT(*) FROM items WHERE owner = ?1 AND kind = 'task'")?;
        let ideas = count("SELECT COUNT(*) FROM items WHERE owner = ?1 AND kind = 'idea'")?;

        let pending = count("SELECT COUNT(*) FROM items WHERE owner = ?1 AND status = 'pending'")?;
        let completed =
            count("SELECT COUNT(*) FROM items WHERE owner = ?1 AND status = 'completed'")?;
        let cancelled =
            count("SELECT COUNT(*) FROM items WHERE owner = ?1 AND status = 'cancelled'")?;

        let high = count(
            "SELECT COUNT(*) FROM items WHERE owner = ?1 AND status = 'pending' AND priority = 'high'",
        )?;
        let medium = count(
            "SELECT COUNT(*) FROM items WHERE owner = ?1 AND status = 'pending' AND priority = 'medium'",
        )?;
        let low = count(
            "SELECT COUNT(*) FROM items WHERE owner = ?1 AND status = 'pending' AND priority = 'low'",
        )?;

        let mut stmt = self.db.prepare(
            "SELECT category, COUNT(*) FROM items
             WHERE owner = ?1 AND status = 'pending' AND category IS NOT NULL
             GROUP BY category ORDER BY COUNT(*) DESC LIMIT 10",
        )?;
        let by_category = stmt
            .query_map(params![owner], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<(String, i64)>, _>>()?;

        Ok(StoreStats {
            total,
            tasks,
            ideas,
            pending,
            completed,
            cancelled,
            pending_high: high,
            pending_medium: medium,
            pending_low: low,
            by_category,
        })
    }

    /// All known category names, alphabetical
    pub fn categories(&self) -> Result<Vec<String>> {
        let mut stmt = self.db.prepare("SELECT name FROM categories ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }
}

/// Aggregate counts for one owner
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub total: i64,
    pub tasks: i64,
    pub ideas: i64,
    pub pending: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub pending_high: i64,
    pub pending_medium: i64,
    pub pending_low: i64,
    /// Pending counts per category, largest first, top 10
    pub by_category: Vec<(String, i64)>,
}

/// Lowercase, trim, drop empties, cap at `MAX_TAGS`
fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .take(MAX_TAGS)
        .collect()
}

fn item_from_row(row: &Row) -> rusqlite::Result<StoredItem> {
    let tags: String = row.get(8)?;
    let tags = if tags.is_empty() {
        Vec::new()
    } else {
        tags.split(',').map(str::to_string).collect()
    };

    Ok(StoredItem {
        id: row.get(0)?,
        owner: row.get(1)?,
        kind: parse_column(row, 2)?,
        content: row.get(3)?,
        priority: parse_optional_column(row, 4)?,
        category: row.get(5)?,
        deadline: parse_date_column(row, 6)?,
        context: row.get(7)?,
        tags,
        status: parse_column(row, 9)?,
        created_at: parse_timestamp_column(row, 10)?,
        updated_at: parse_timestamp_column(row, 11)?,
    })
}

fn parse_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = anyhow::Error>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: anyhow::Error| conversion_error(idx, e.into()))
}

fn parse_optional_column<T>(row: &Row, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = anyhow::Error>,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        s.parse()
            .map_err(|e: anyhow::Error| conversion_error(idx, e.into()))
    })
    .transpose()
}

fn parse_date_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| s.parse().map_err(|e| conversion_error(idx, Box::new(e))))
        .transpose()
}

fn parse_timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, Box::new(e)))
}

fn conversion_error(
    idx: usize,
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, source)
}
